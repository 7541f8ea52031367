//! Configuration port interface

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    ///
    /// A missing file yields an empty config, not an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist configuration, creating parent directories as needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the backing file
    fn path(&self) -> PathBuf;

    /// Whether the backing file exists
    fn exists(&self) -> bool;

    /// Write the defaults. Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Load configuration, logging and ignoring unreadable files.
    async fn load_or_empty(&self) -> AppConfig {
        match self.load().await {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "ignoring unreadable config file");
                AppConfig::empty()
            }
        }
    }
}
