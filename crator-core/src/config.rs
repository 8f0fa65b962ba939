use std::path::PathBuf;
use std::time::Duration;

/// Options for configuring a [`crate::PageSaver`]
#[derive(Debug, Clone)]
pub struct SaverConfig {
    /// Directory receiving `<identifier>.html` files
    pub save_dir: PathBuf,
    /// Number of parallel write workers
    pub workers: usize,
    /// Longest the dispatcher sleeps before re-checking an empty queue
    pub poll_interval: Duration,
    /// Delay between successive submissions to the worker pool; zero disables pacing
    pub submit_interval: Duration,
}

impl SaverConfig {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            workers: 1,
            poll_interval: Duration::from_millis(100),
            submit_interval: Duration::from_millis(100),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_submit_interval(mut self, submit_interval: Duration) -> Self {
        self.submit_interval = submit_interval;
        self
    }
}
