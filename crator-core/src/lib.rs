pub mod config;
pub mod detect;
pub mod error;
pub mod saver;
pub mod storage;
pub mod verify;

pub use config::SaverConfig;
pub use error::{DetectError, SaveError};
pub use saver::{PageSaver, SaveTask, SaverState, SaverStats, StatsSnapshot};
pub use storage::{FsWriter, PageWriter, page_path};
pub use verify::{PageVerifier, Verdict, link_valid, verify_page};
