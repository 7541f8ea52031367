//! Notification surface port interface

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::banner::PushBanner;

/// Surface errors
#[derive(Debug, Clone, Error)]
pub enum SurfaceError {
    #[error("Surface unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to show surface: {0}")]
    ShowFailed(String),

    #[error("Failed to dispose surface: {0}")]
    DisposeFailed(String),
}

/// Callback a surface fires when it is closed by something other than the
/// presenter (the user dismissed it, the window went away).
///
/// Firing consumes the signal, so it can only fire once.
pub struct CloseSignal {
    callback: Box<dyn FnOnce() + Send>,
}

impl CloseSignal {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A signal that does nothing when fired
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Report that the surface was closed externally
    pub fn fire(self) {
        (self.callback)()
    }
}

impl fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSignal").finish_non_exhaustive()
    }
}

/// A live rendering of the banner
#[async_trait]
pub trait Surface: Send + Sync {
    /// Remove the surface.
    ///
    /// Must be idempotent: disposing an already disposed (or externally
    /// closed) surface returns Ok(()).
    async fn dispose(&self) -> Result<(), SurfaceError>;
}

/// Port for opening notification surfaces
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    /// Short name for logs and status
    fn name(&self) -> &'static str;

    /// Open a new surface showing the banner.
    ///
    /// # Arguments
    /// * `banner` - The rendered banner document
    /// * `on_close` - Fired if the surface is closed externally. Surfaces that
    ///   cannot observe external closes may drop it.
    async fn open(
        &self,
        banner: &PushBanner,
        on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError>;
}
