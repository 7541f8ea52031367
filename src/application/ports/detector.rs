//! Push detector port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::detection::{Detection, DetectionSource};

/// Detector errors
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Failed to watch {path}: {message}")]
    Watch { path: String, message: String },

    #[error("Detector already started")]
    AlreadyStarted,
}

/// Receiving end of the detection channel
pub type DetectionReceiver = mpsc::UnboundedReceiver<Detection>;

/// Handle detectors use to report pushes.
///
/// Sending never blocks, so it is safe to call from watcher callback threads.
#[derive(Debug, Clone)]
pub struct DetectionSender {
    tx: mpsc::UnboundedSender<Detection>,
}

impl DetectionSender {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, DetectionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a push-like event
    pub fn emit(&self, source: DetectionSource) {
        debug!(%source, "push detected");
        if self.tx.send(Detection::new(source)).is_err() {
            debug!("detection dropped, dispatcher is gone");
        }
    }
}

/// A source of push detections.
///
/// Each detector is independently startable and stoppable. `start` must not
/// block; long-running work belongs in spawned tasks or watcher threads.
#[async_trait]
pub trait PushDetector: Send + Sync {
    /// Short description for logs and status (e.g. `reflog:/repo`)
    fn name(&self) -> String;

    /// Start reporting detections through `sender`.
    async fn start(&mut self, sender: DetectionSender) -> Result<(), DetectorError>;

    /// Stop reporting and release any watch handles. Idempotent.
    async fn stop(&mut self);

    /// Whether the detector holds a live watch after `start`.
    ///
    /// A detector may start successfully without watching anything (nothing
    /// to watch, integration absent).
    fn is_active(&self) -> bool {
        true
    }
}
