//! Timer-driven task scheduling.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

struct SchedulerInner {
    pending: AtomicUsize,
    shutdown: watch::Sender<bool>,
}

/// Decrements the pending count when a scheduled task ends, however it ends.
struct PendingGuard(Arc<SchedulerInner>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Spawns delayed tasks on the tokio runtime.
///
/// Every task runs independently; there is no concurrency limit. Tasks
/// still waiting on their delay are cancelled by [`JobScheduler::shutdown`].
/// Delays use `tokio::time`, so paused-clock tests advance them instantly.
#[derive(Clone)]
pub struct JobScheduler {
    inner: Arc<SchedulerInner>,
}

impl JobScheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(SchedulerInner {
                pending: AtomicUsize::new(0),
                shutdown,
            }),
        }
    }

    /// Run `task` after `delay`.
    ///
    /// Returns `false` if the scheduler has been shut down and the task was
    /// dropped.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            warn!(delay_ms = delay.as_millis(), "Scheduler is shut down, dropping task");
            return false;
        }

        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard(self.inner.clone());
        let shutdown = self.inner.shutdown.subscribe();

        tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                () = tokio::time::sleep(delay) => task.await,
                () = stopped(shutdown) => debug!("Scheduled task cancelled by shutdown"),
            }
        });
        true
    }

    /// Number of tasks waiting on their delay or running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Whether [`JobScheduler::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Cancel waiting tasks and refuse new ones.
    ///
    /// Returns the number of tasks that were pending.
    pub fn shutdown(&self) -> usize {
        let pending = self.pending();
        self.inner.shutdown.send_replace(true);
        info!(pending, "Job scheduler shut down");
        pending
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can request a shutdown any more.
            std::future::pending::<()>().await;
        }
    }
}
