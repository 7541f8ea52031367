//! Background wait for a surface being closed by someone else

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::ports::CloseSignal;

/// Fires a [`CloseSignal`] when the watched future reports an external close.
///
/// The future resolves to `true` for an external close and `false` when it
/// can no longer tell (watch dropped, connection lost). Cancelling or
/// dropping the watch guarantees the signal never fires, so surfaces cancel
/// it before tearing themselves down.
pub(crate) struct CloseWatch {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CloseWatch {
    /// Start waiting. Must be called from within a tokio runtime.
    pub(crate) fn spawn<F>(closed: F, signal: CloseSignal) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            if closed.await {
                debug!("surface closed externally");
                signal.fire();
            }
        });
        Self {
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop waiting; the signal will not fire afterwards
    pub(crate) fn cancel(&self) {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for CloseWatch {
    fn drop(&mut self) {
        self.cancel();
    }
}
