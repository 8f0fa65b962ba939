// Background persistence queue: callers enqueue accepted pages, a dispatcher
// task drains them in FIFO order into a fixed pool of write workers.

use crate::config::SaverConfig;
use crate::error::SaveError;
use crate::storage::{FsWriter, PageWriter, page_path};
use crator_scanner::Response;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as TokioMutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaverState {
    Created,
    Running,
    Stopped,
}

/// One page to be written as `<identifier>.html`
#[derive(Debug, Clone)]
pub struct SaveTask {
    pub page: Response,
    pub identifier: String,
}

#[derive(Debug, Default)]
pub struct SaverStats {
    enqueued: AtomicUsize,
    submitted: AtomicUsize,
    saved: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub enqueued: usize,
    pub submitted: usize,
    pub saved: usize,
    pub failed: usize,
}

impl SaverStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

struct Queue {
    state: SaverState,
    pending: VecDeque<SaveTask>,
}

struct Shared {
    queue: Mutex<Queue>,
    wake: Notify,
    stats: SaverStats,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        // Nothing panics while the lock is held, so a poisoned queue is still consistent.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Persistence queue decoupling page acceptance from disk writes.
///
/// Lifecycle is `Created -> Running -> Stopped`. Pages may be enqueued before
/// [`PageSaver::start`]; they wait until the dispatcher runs. Submission to the
/// worker pool follows enqueue order, completion order does not.
pub struct PageSaver<W: PageWriter = FsWriter> {
    config: SaverConfig,
    writer: Arc<W>,
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PageSaver<FsWriter> {
    pub fn with_fs(config: SaverConfig) -> Self {
        Self::new(config, FsWriter)
    }
}

impl<W: PageWriter> PageSaver<W> {
    pub fn new(config: SaverConfig, writer: W) -> Self {
        Self {
            config,
            writer: Arc::new(writer),
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    state: SaverState::Created,
                    pending: VecDeque::new(),
                }),
                wake: Notify::new(),
                stats: SaverStats::default(),
            }),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SaverConfig {
        &self.config
    }

    pub fn state(&self) -> SaverState {
        self.shared.lock().state
    }

    /// Number of tasks not yet handed to the worker pool
    pub fn pending(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Queue `page` to be written as `<identifier>.html`.
    ///
    /// Never waits on I/O. Rejected once the saver is stopped.
    pub fn enqueue(&self, page: Response, identifier: impl ToString) -> Result<(), SaveError> {
        let identifier = identifier.to_string();
        {
            let mut queue = self.shared.lock();
            if queue.state == SaverState::Stopped {
                debug!("Rejecting page {} for stopped saver", identifier);
                return Err(SaveError::Stopped);
            }
            queue.pending.push_back(SaveTask { page, identifier });
        }
        self.shared.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Spawn the worker pool and the dispatcher on the current tokio runtime.
    pub fn start(&self) -> Result<(), SaveError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SaveError::NoRuntime(e.to_string()))?;

        {
            let mut queue = self.shared.lock();
            match queue.state {
                SaverState::Running => return Err(SaveError::AlreadyStarted),
                SaverState::Stopped => return Err(SaveError::Stopped),
                SaverState::Created => queue.state = SaverState::Running,
            }
        }

        let workers = self.config.workers.max(1);
        let (tx, rx) = mpsc::channel::<SaveTask>(workers);
        let rx = Arc::new(TokioMutex::new(rx));

        let mut handles = Vec::with_capacity(workers + 1);
        for worker_id in 0..workers {
            let rx = rx.clone();
            let writer = self.writer.clone();
            let shared = self.shared.clone();
            let save_dir = self.config.save_dir.clone();
            handles.push(runtime.spawn(async move {
                Self::worker_loop(worker_id, rx, writer, save_dir, shared).await;
            }));
        }

        let shared = self.shared.clone();
        let poll_interval = self.config.poll_interval;
        let submit_interval = self.config.submit_interval;
        handles.push(runtime.spawn(async move {
            Self::dispatch_loop(tx, shared, poll_interval, submit_interval).await;
        }));

        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(handles);

        info!(
            "Page saver started with {} worker(s), saving to {}",
            workers,
            self.config.save_dir.display()
        );
        Ok(())
    }

    /// Stop dispatching. Pages already handed to workers are still written;
    /// pages still pending are dropped.
    pub fn stop(&self) {
        let dropped = {
            let mut queue = self.shared.lock();
            if queue.state == SaverState::Stopped {
                return;
            }
            queue.state = SaverState::Stopped;
            queue.pending.len()
        };
        info!("Page saver stopping ({} pending page(s) not dispatched)", dropped);
        self.shared.wake.notify_one();
    }

    /// Wait for the dispatcher to exit and the workers to finish every page
    /// they were handed. Only returns once [`PageSaver::stop`] has been called.
    pub async fn join(&self) {
        let handles = std::mem::take(
            &mut *self
                .handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Page saver task failed: {}", e);
            }
        }
    }

    /// [`PageSaver::stop`] followed by [`PageSaver::join`]
    pub async fn shutdown(&self) {
        self.stop();
        self.join().await;
        let stats = self.stats();
        info!(
            "Page saver finished: {} saved, {} failed, {} enqueued",
            stats.saved, stats.failed, stats.enqueued
        );
    }

    /// Wait until every enqueued page has been handed to the worker pool, then
    /// shut down. A saver that never started is just stopped.
    pub async fn finish(&self) {
        while self.state() == SaverState::Running {
            let stats = self.stats();
            if self.pending() == 0 && stats.submitted >= stats.enqueued {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
        self.shutdown().await;
    }

    async fn dispatch_loop(
        tx: mpsc::Sender<SaveTask>,
        shared: Arc<Shared>,
        poll_interval: Duration,
        submit_interval: Duration,
    ) {
        debug!("Dispatcher started");

        loop {
            let batch = {
                let mut queue = shared.lock();
                if queue.state == SaverState::Stopped {
                    break;
                }
                std::mem::take(&mut queue.pending)
            };

            if batch.is_empty() {
                // Notify keeps a permit for wake-ups sent while we were busy;
                // the timeout bounds the latency if one is ever missed.
                let _ = tokio::time::timeout(poll_interval, shared.wake.notified()).await;
                continue;
            }

            debug!("Dispatching {} page(s)", batch.len());
            for (idx, task) in batch.into_iter().enumerate() {
                if idx > 0 && !submit_interval.is_zero() {
                    tokio::time::sleep(submit_interval).await;
                }
                let identifier = task.identifier.clone();
                if tx.send(task).await.is_err() {
                    warn!("Worker pool closed, page {} not submitted", identifier);
                    return;
                }
                shared.stats.submitted.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!("Dispatcher stopped");
    }

    async fn worker_loop(
        worker_id: usize,
        rx: Arc<TokioMutex<mpsc::Receiver<SaveTask>>>,
        writer: Arc<W>,
        save_dir: PathBuf,
        shared: Arc<Shared>,
    ) {
        debug!("Worker {} started", worker_id);

        loop {
            let task = rx.lock().await.recv().await;
            let Some(SaveTask { page, identifier }) = task else {
                break;
            };

            let path = page_path(&save_dir, &identifier);
            let writer = writer.clone();
            let target = path.clone();
            let result =
                tokio::task::spawn_blocking(move || writer.write_page(&page.body, &target)).await;

            match result {
                Ok(Ok(())) => {
                    shared.stats.saved.fetch_add(1, Ordering::Relaxed);
                    debug!("[Worker {}] Saved {}", worker_id, path.display());
                }
                Ok(Err(e)) => {
                    shared.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("[Worker {}] Failed to save {}: {}", worker_id, path.display(), e);
                }
                Err(e) => {
                    shared.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("[Worker {}] Write of {} aborted: {}", worker_id, path.display(), e);
                }
            }
        }

        debug!("Worker {} finished", worker_id);
    }
}

impl<W: PageWriter> Drop for PageSaver<W> {
    fn drop(&mut self) {
        self.stop();
    }
}
