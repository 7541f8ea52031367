//! Domain error types

use thiserror::Error;

/// Error when an unknown surface kind is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid surface: \"{input}\". Valid surfaces are: overlay, desktop, terminal, html")]
pub struct InvalidSurfaceError {
    pub input: String,
}

/// Error when an unknown push command id is provided
#[derive(Debug, Clone, Error)]
#[error("Unknown push command: \"{input}\". Valid commands are: {valid}")]
pub struct UnknownPushCommandError {
    pub input: String,
    pub valid: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
