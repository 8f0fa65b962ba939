pub mod error;
pub mod fetcher;
pub mod response;

pub use error::ScanError;
pub use fetcher::{FetchOptions, Fetcher};
pub use response::{RedirectRecord, Response};
