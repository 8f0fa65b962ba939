use thiserror::Error;

/// Caller contract violations raised by the detectors. Heuristic failures never
/// surface here; they collapse to each check's bias instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DetectError {
    #[error("Response for {url} was never fetched")]
    NotFetched { url: String },

    #[error("No <body> element in response for {url}")]
    MissingBody { url: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SaveError {
    #[error("Page saver already started")]
    AlreadyStarted,

    #[error("Page saver is stopped")]
    Stopped,

    #[error("Page saver needs a tokio runtime: {0}")]
    NoRuntime(String),
}
