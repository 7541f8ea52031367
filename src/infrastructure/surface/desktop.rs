//! Desktop notification surface using notify-rust

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{CloseSignal, Surface, SurfaceError, SurfaceFactory};
use crate::domain::banner::PushBanner;

#[cfg(all(unix, not(target_os = "macos")))]
use super::close_watch::CloseWatch;
#[cfg(all(unix, not(target_os = "macos")))]
use notify_rust::{NotificationHandle, NotificationResponse};
#[cfg(all(unix, not(target_os = "macos")))]
use std::sync::Arc;

const APP_NAME: &str = "you-pushed";

/// Opens a desktop notification per banner
pub struct DesktopSurfaceFactory {
    app_name: String,
}

impl DesktopSurfaceFactory {
    pub fn new() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
        }
    }

    /// Create with custom app name
    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for DesktopSurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SurfaceFactory for DesktopSurfaceFactory {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn open(
        &self,
        banner: &PushBanner,
        on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        let app_name = self.app_name.clone();
        let title = banner.title;
        let subtitle = banner.subtitle;
        let timeout = u32::try_from(banner.lifetime.as_millis()).unwrap_or(u32::MAX);

        // notify-rust talks to the notification daemon synchronously
        let handle = tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(&app_name)
                .summary(title)
                .body(subtitle)
                .timeout(notify_rust::Timeout::Milliseconds(timeout))
                .show()
                .map_err(|e| SurfaceError::ShowFailed(e.to_string()))
        })
        .await
        .map_err(|e| SurfaceError::ShowFailed(format!("Task join error: {}", e)))??;

        Ok(Box::new(DesktopSurface::new(handle, on_close)))
    }
}

/// Whether the notification server reports the notification as gone.
///
/// Clicking the body dismisses it on most servers, so the default action
/// counts as well.
#[cfg(all(unix, not(target_os = "macos")))]
fn closes_notification(response: &NotificationResponse) -> bool {
    matches!(
        response,
        NotificationResponse::Closed(_) | NotificationResponse::Default
    )
}

/// A shown desktop notification.
///
/// On freedesktop platforms the handle can close the notification early and
/// reports when the server closes it. Elsewhere the notification expires on
/// its own timeout.
struct DesktopSurface {
    #[cfg(all(unix, not(target_os = "macos")))]
    handle: std::sync::Mutex<Option<Arc<NotificationHandle>>>,
    #[cfg(all(unix, not(target_os = "macos")))]
    close: CloseWatch,
}

impl DesktopSurface {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn new(handle: NotificationHandle, on_close: CloseSignal) -> Self {
        let handle = Arc::new(handle);
        let watched = Arc::clone(&handle);
        let close = CloseWatch::spawn(
            async move {
                let mut response = None;
                watched
                    .wait_for_action_async(|r| response = Some(r.clone()))
                    .await;
                response.as_ref().is_some_and(closes_notification)
            },
            on_close,
        );

        Self {
            handle: std::sync::Mutex::new(Some(handle)),
            close,
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn new<H>(_handle: H, _on_close: CloseSignal) -> Self {
        Self {}
    }
}

#[async_trait]
impl Surface for DesktopSurface {
    #[cfg(all(unix, not(target_os = "macos")))]
    async fn dispose(&self) -> Result<(), SurfaceError> {
        // Closing it ourselves must not report an external close
        self.close.cancel();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(handle) = handle {
            handle.close_async().await;
            debug!("desktop notification closed");
        }
        Ok(())
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    async fn dispose(&self) -> Result<(), SurfaceError> {
        debug!("desktop notification left to expire");
        Ok(())
    }
}
