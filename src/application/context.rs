//! Push context
//!
//! The one object that owns the single-instance state of a session: the
//! presenter (current surface, dismiss timer) and the trigger (pending
//! debounce timer). Independent contexts never share state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::banner::DISPLAY_DURATION;

use super::notification::NotificationPresenter;
use super::ports::{SurfaceError, SurfaceFactory};
use super::trigger::{PushTrigger, DEBOUNCE_DELAY};

/// Presenter plus trigger for one session
#[derive(Clone)]
pub struct PushContext {
    presenter: NotificationPresenter,
    trigger: PushTrigger,
}

impl PushContext {
    /// Create a context with the standard debounce and display durations
    pub fn new(factory: Arc<dyn SurfaceFactory>) -> Self {
        Self::with_timings(factory, DEBOUNCE_DELAY, DISPLAY_DURATION)
    }

    /// Create with custom debounce and display durations
    pub fn with_timings(
        factory: Arc<dyn SurfaceFactory>,
        debounce: Duration,
        display: Duration,
    ) -> Self {
        let presenter = NotificationPresenter::with_display_duration(factory, display);
        let trigger = PushTrigger::with_delay(presenter.clone(), debounce);
        Self { presenter, trigger }
    }

    pub fn presenter(&self) -> &NotificationPresenter {
        &self.presenter
    }

    pub fn trigger(&self) -> &PushTrigger {
        &self.trigger
    }

    /// Show the banner immediately, bypassing detection and debounce
    pub async fn test_animation(&self) -> Result<(), SurfaceError> {
        info!("test animation requested");
        self.presenter.show().await
    }

    /// Cancel any pending show and dispose the live surface
    pub async fn shutdown(&self) {
        self.trigger.cancel();
        self.presenter.dispose_all().await;
    }
}
