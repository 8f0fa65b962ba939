use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One hop of a redirect chain: the URL that was requested and the 3xx status it answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    pub status_code: u16,
    pub url: String,
}

impl RedirectRecord {
    pub fn new(status_code: u16, url: impl Into<String>) -> Self {
        Self {
            status_code,
            url: url.into(),
        }
    }
}

/// Snapshot of a single HTTP exchange after redirects were followed.
///
/// `history` is chronological, oldest hop first. A `status_code` of 0 marks a
/// placeholder that never went over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub history: Vec<RedirectRecord>,
}

impl Response {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: 0,
            content_type: None,
            body: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_history(mut self, history: Vec<RedirectRecord>) -> Self {
        self.history = history;
        self
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_fetched(&self) -> bool {
        self.status_code != 0
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}
