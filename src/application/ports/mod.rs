//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod command_host;
pub mod config;
pub mod detector;
pub mod git_integration;
pub mod surface;

// Re-export common types
pub use command_host::{CommandError, CommandHost, CommandOutput};
pub use config::ConfigStore;
pub use detector::{DetectionReceiver, DetectionSender, DetectorError, PushDetector};
pub use git_integration::{GitApi, GitIntegration, IntegrationError, Repository};
pub use surface::{CloseSignal, Surface, SurfaceError, SurfaceFactory};
