//! Command host port interface
//!
//! The host owns the real push-like commands. Wrapped commands forward to it.

use async_trait::async_trait;
use thiserror::Error;

/// Command execution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Command '{0}' is not registered with the host")]
    UnknownCommand(String),

    #[error("Command '{command}' could not be started: {message}")]
    Unavailable { command: String, message: String },

    #[error("Command '{command}' failed: {message}")]
    Failed { command: String, message: String },
}

/// Result of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, when the host runs a process
    pub code: Option<i32>,
}

/// Port for executing host commands
#[async_trait]
pub trait CommandHost: Send + Sync {
    /// Execute a command by id with forwarded arguments.
    ///
    /// # Arguments
    /// * `command` - Command id (e.g. `git.pushForce`)
    /// * `args` - Arguments forwarded unchanged
    async fn execute(&self, command: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}
