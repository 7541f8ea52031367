//! Domain layer - Core push-banner logic
//!
//! Contains value objects, the banner document, detection events and
//! domain errors. This layer has no dependencies on external systems.

pub mod banner;
pub mod config;
pub mod detection;
pub mod error;
pub mod surface;

// Re-export common types
pub use banner::{PushBanner, DISPLAY_DURATION};
pub use config::AppConfig;
pub use detection::{Detection, DetectionSource, GitCommandEvent, OperationEvent, OperationKind};
pub use error::*;
pub use surface::{SurfaceKind, SurfaceState};
