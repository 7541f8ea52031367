//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: filesystem watching,
//! notification surfaces, the relay integration, the git CLI and config
//! storage.

pub mod command;
pub mod config;
pub mod integration;
pub mod reflog;
pub mod surface;

// Re-export adapters
pub use command::GitCliHost;
pub use config::XdgConfigStore;
pub use integration::{RelayApi, RelayError, RelayIntegration, RELAY_API_VERSION};
pub use reflog::{ReflogWatcher, REMOTE_REFLOG_DIR};
pub use surface::{
    create_surface_factory, DesktopSurfaceFactory, HtmlSurfaceFactory, TerminalSurfaceFactory,
};
#[cfg(target_os = "linux")]
pub use surface::OverlaySurfaceFactory;
