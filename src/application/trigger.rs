//! Debounced push trigger
//!
//! Bursts of detections (two listeners firing for the same push, several
//! reflog files touched by one push) collapse into a single banner shown
//! after a quiet period.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::notification::NotificationPresenter;

/// Quiet period before the banner is shown
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Default)]
struct PendingTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Debounces detections into presenter shows
#[derive(Clone)]
pub struct PushTrigger {
    presenter: NotificationPresenter,
    delay: Duration,
    pending: Arc<Mutex<PendingTimer>>,
}

fn lock(pending: &Mutex<PendingTimer>) -> MutexGuard<'_, PendingTimer> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

impl PushTrigger {
    /// Create a trigger with the default 500ms delay
    pub fn new(presenter: NotificationPresenter) -> Self {
        Self::with_delay(presenter, DEBOUNCE_DELAY)
    }

    /// Create with a custom delay
    pub fn with_delay(presenter: NotificationPresenter, delay: Duration) -> Self {
        Self {
            presenter,
            delay,
            pending: Arc::new(Mutex::new(PendingTimer::default())),
        }
    }

    /// Cancel any pending show and schedule a new one after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self) {
        let mut pending = lock(&self.pending);
        if let Some(handle) = pending.handle.take() {
            handle.abort();
            debug!("debounced pending banner");
        }
        pending.generation += 1;

        let generation = pending.generation;
        let delay = self.delay;
        let presenter = self.presenter.clone();
        let state = Arc::clone(&self.pending);

        pending.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut pending = lock(&state);
                if pending.generation != generation {
                    return;
                }
                pending.handle = None;
            }

            if let Err(e) = presenter.show().await {
                warn!(error = %e, "failed to show banner");
            }
        }));
    }

    /// Drop any pending show
    pub fn cancel(&self) {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
    }

    /// Whether a show is scheduled
    pub fn is_pending(&self) -> bool {
        lock(&self.pending).handle.is_some()
    }

    /// The presenter this trigger drives
    pub fn presenter(&self) -> &NotificationPresenter {
        &self.presenter
    }
}
