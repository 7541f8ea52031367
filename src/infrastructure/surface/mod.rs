//! Notification surface adapters
//!
//! Each adapter renders the push banner somewhere different: a full-screen
//! overlay, a desktop notification, a banner on the terminal, or an HTML page
//! on disk.

mod close_watch;
mod desktop;
mod html;
#[cfg(target_os = "linux")]
mod overlay;
mod terminal;

pub use desktop::DesktopSurfaceFactory;
pub use html::HtmlSurfaceFactory;
#[cfg(target_os = "linux")]
pub use overlay::{OverlayError, OverlaySurfaceFactory};
pub use terminal::TerminalSurfaceFactory;

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::SurfaceFactory;
use crate::domain::SurfaceKind;

/// Create the surface factory for the configured kind
pub fn create_surface_factory(kind: SurfaceKind, html_dir: PathBuf) -> Arc<dyn SurfaceFactory> {
    match kind {
        #[cfg(target_os = "linux")]
        SurfaceKind::Overlay => Arc::new(OverlaySurfaceFactory::new()),
        // Layer-shell overlays only exist on Linux
        #[cfg(not(target_os = "linux"))]
        SurfaceKind::Overlay => Arc::new(DesktopSurfaceFactory::new()),
        SurfaceKind::Desktop => Arc::new(DesktopSurfaceFactory::new()),
        SurfaceKind::Terminal => Arc::new(TerminalSurfaceFactory::new()),
        SurfaceKind::Html => Arc::new(HtmlSurfaceFactory::new(html_dir)),
    }
}
