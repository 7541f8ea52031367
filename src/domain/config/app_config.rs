//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::surface::SurfaceKind;

/// Default log level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace roots whose remote reflogs are watched
    pub workspaces: Option<Vec<String>>,
    /// Surface used to render the banner
    pub surface: Option<String>,
    /// Whether the git integration bridge is enabled
    pub integration: Option<bool>,
    /// Directory for the html surface
    pub html_dir: Option<String>,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            workspaces: None,
            surface: Some(SurfaceKind::default().to_string()),
            integration: Some(true),
            html_dir: None,
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            workspaces: other.workspaces.or(self.workspaces),
            surface: other.surface.or(self.surface),
            integration: other.integration.or(self.integration),
            html_dir: other.html_dir.or(self.html_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Workspace roots, or the current directory if none are configured
    pub fn workspaces_or_default(&self) -> Vec<PathBuf> {
        match self.workspaces.as_ref() {
            Some(list) if !list.is_empty() => list.iter().map(PathBuf::from).collect(),
            _ => vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))],
        }
    }

    /// Get surface as parsed SurfaceKind, or default if not set/invalid
    pub fn surface_or_default(&self) -> SurfaceKind {
        self.surface
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get integration setting, or true if not set
    pub fn integration_or_default(&self) -> bool {
        self.integration.unwrap_or(true)
    }

    /// Get html surface directory, or the runtime directory if not set
    pub fn html_dir_or_default(&self) -> PathBuf {
        self.html_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("XDG_RUNTIME_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| std::env::temp_dir())
            })
    }

    /// Get log level, or "info" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.workspaces.is_none());
        assert_eq!(config.surface, Some("overlay".to_string()));
        assert_eq!(config.integration, Some(true));
        assert!(config.html_dir.is_none());
        assert_eq!(config.log_level, Some("info".to_string()));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.workspaces.is_none());
        assert!(config.surface.is_none());
        assert!(config.integration.is_none());
        assert!(config.html_dir.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            surface: Some("desktop".to_string()),
            integration: Some(true),
            log_level: Some("info".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            surface: Some("terminal".to_string()),
            integration: None, // Should not override
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.surface, Some("terminal".to_string()));
        assert_eq!(merged.integration, Some(true)); // Kept from base
        assert_eq!(merged.log_level, Some("debug".to_string()));
    }

    #[test]
    fn merge_replaces_workspace_list_wholesale() {
        let base = AppConfig {
            workspaces: Some(vec!["/a".to_string(), "/b".to_string()]),
            ..Default::default()
        };
        let other = AppConfig {
            workspaces: Some(vec!["/c".to_string()]),
            ..Default::default()
        };
        let merged = base.merge(other);
        assert_eq!(merged.workspaces, Some(vec!["/c".to_string()]));
    }

    #[test]
    fn workspaces_or_default_uses_configured_roots() {
        let config = AppConfig {
            workspaces: Some(vec!["/repo".to_string(), "/other".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            config.workspaces_or_default(),
            vec![PathBuf::from("/repo"), PathBuf::from("/other")]
        );
    }

    #[test]
    fn workspaces_or_default_falls_back_to_cwd() {
        let config = AppConfig {
            workspaces: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(config.workspaces_or_default().len(), 1);
    }

    #[test]
    fn surface_or_default_parses() {
        let config = AppConfig {
            surface: Some("html".to_string()),
            ..Default::default()
        };
        assert_eq!(config.surface_or_default(), SurfaceKind::Html);
    }

    #[test]
    fn surface_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            surface: Some("hologram".to_string()),
            ..Default::default()
        };
        assert_eq!(config.surface_or_default(), SurfaceKind::Overlay);
    }

    #[test]
    fn integration_defaults_to_enabled() {
        assert!(AppConfig::empty().integration_or_default());
    }

    #[test]
    fn html_dir_or_default_returns_configured() {
        let config = AppConfig {
            html_dir: Some("/tmp/banners".to_string()),
            ..Default::default()
        };
        assert_eq!(config.html_dir_or_default(), PathBuf::from("/tmp/banners"));
    }

    #[test]
    fn log_level_or_default_returns_info() {
        assert_eq!(AppConfig::empty().log_level_or_default(), "info");
    }
}
