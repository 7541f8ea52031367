//! Terminal banner surface

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use colored::Colorize;
use tracing::debug;

use crate::application::ports::{CloseSignal, Surface, SurfaceError, SurfaceFactory};
use crate::domain::banner::PushBanner;

/// Prints the banner to stderr.
///
/// Printed lines cannot be closed by anyone else, so the close signal is
/// never fired.
#[derive(Debug, Default)]
pub struct TerminalSurfaceFactory;

impl TerminalSurfaceFactory {
    pub fn new() -> Self {
        Self
    }
}

/// Banner lines, padded to a common width
fn banner_lines(banner: &PushBanner) -> Vec<String> {
    let width = banner.title.len().max(banner.subtitle.len()) + 8;
    let rule = "=".repeat(width);
    let center = |text: &str| format!("{:^width$}", text, width = width);
    vec![rule.clone(), center(banner.title), center(banner.subtitle), rule]
}

#[async_trait]
impl SurfaceFactory for TerminalSurfaceFactory {
    fn name(&self) -> &'static str {
        "terminal"
    }

    async fn open(
        &self,
        banner: &PushBanner,
        _on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        let lines = banner_lines(banner);
        eprintln!();
        for (i, line) in lines.iter().enumerate() {
            if i == 1 {
                eprintln!("{}", line.yellow().bold());
            } else {
                eprintln!("{}", line.dimmed());
            }
        }
        eprintln!();

        Ok(Box::new(TerminalSurface {
            disposed: AtomicBool::new(false),
        }))
    }
}

struct TerminalSurface {
    disposed: AtomicBool,
}

#[async_trait]
impl Surface for TerminalSurface {
    async fn dispose(&self) -> Result<(), SurfaceError> {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            debug!("terminal banner dismissed");
        }
        Ok(())
    }
}
