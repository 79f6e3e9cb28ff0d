//! Start/stop handle for the worker's interval loops.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long [`WorkerHandle::stop`] waits for a loop to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A running background loop.
///
/// Owns the loop's [`CancellationToken`] and task. Dropping the handle does
/// not stop the loop; call [`stop`](Self::stop).
pub struct WorkerHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn `run` with a fresh cancellation token.
    pub fn spawn<F, Fut>(name: &'static str, run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(cancel.clone()));
        Self { name, cancel, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait (bounded) for it to exit.
    ///
    /// Loops finish the work they already started before returning, so the
    /// bound covers that work too.
    pub async fn stop(self) {
        self.cancel.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, self.task).await {
            Ok(Ok(())) => tracing::info!(worker = self.name, "Worker stopped"),
            Ok(Err(e)) => tracing::error!(worker = self.name, error = %e, "Worker task failed"),
            Err(_) => tracing::warn!(worker = self.name, "Worker did not stop in time"),
        }
    }
}
