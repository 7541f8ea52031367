//! Notification surface state and surface kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidSurfaceError;

/// Observable state of the notification surface.
///
/// State machine:
///   ABSENT -> SHOWN (show)
///   SHOWN -> SHOWN (show; the old surface is disposed first)
///   SHOWN -> ABSENT (auto-dismiss, external close, dispose_all)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceState {
    #[default]
    Absent,
    Shown,
}

impl SurfaceState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Shown => "shown",
        }
    }
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the banner is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceKind {
    /// Full-screen click-through panel above every window.
    /// Falls back to a desktop notification where no overlay can be shown.
    #[default]
    Overlay,
    /// Desktop notification (notify-rust)
    Desktop,
    /// Colored banner on the daemon's terminal
    Terminal,
    /// HTML page written to disk
    Html,
}

/// Valid surface names
pub const VALID_SURFACES: &[&str] = &["overlay", "desktop", "terminal", "html"];

impl SurfaceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Desktop => "desktop",
            Self::Terminal => "terminal",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SurfaceKind {
    type Err = InvalidSurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overlay" => Ok(Self::Overlay),
            "desktop" => Ok(Self::Desktop),
            "terminal" => Ok(Self::Terminal),
            "html" => Ok(Self::Html),
            _ => Err(InvalidSurfaceError {
                input: s.to_string(),
            }),
        }
    }
}
