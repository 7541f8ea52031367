//! Push command wrappers
//!
//! Each wrapper forwards to a real push-like host command and reports a
//! detection only when that command succeeds. Wrappers are never substituted
//! for the real commands; something has to invoke the wrapper id explicitly.

use tracing::debug;

use crate::domain::detection::DetectionSource;
use crate::domain::error::UnknownPushCommandError;

use super::ports::{CommandError, CommandHost, CommandOutput, DetectionSender};

/// Push-like host commands that get a wrapper
pub const PUSH_COMMANDS: &[&str] = &[
    "git.pushForce",
    "git.pushTo",
    "git.pushWithTags",
    "git.sync",
    "git.syncRebase",
    "git.publish",
];

/// Prefix of every wrapper id
pub const WRAPPER_PREFIX: &str = "you-pushed.";

/// A wrapper around one push-like command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandWrapper {
    original: &'static str,
    id: String,
}

impl CommandWrapper {
    fn new(original: &'static str) -> Self {
        Self {
            original,
            id: format!("{}{}", WRAPPER_PREFIX, original),
        }
    }

    /// Id of the wrapped host command
    pub fn original(&self) -> &'static str {
        self.original
    }

    /// Id the wrapper is registered under
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the original command. On success a detection is emitted; on
    /// failure the host's error is returned unchanged and nothing is emitted.
    pub async fn invoke<H>(
        &self,
        host: &H,
        args: &[String],
        sender: &DetectionSender,
    ) -> Result<CommandOutput, CommandError>
    where
        H: CommandHost + ?Sized,
    {
        debug!(command = self.original, ?args, "running wrapped command");
        let output = host.execute(self.original, args).await?;

        sender.emit(DetectionSource::WrappedCommand {
            command: self.original.to_string(),
        });
        Ok(output)
    }
}

/// The registered set of wrappers
#[derive(Debug, Clone)]
pub struct CommandWrappers {
    wrappers: Vec<CommandWrapper>,
}

impl CommandWrappers {
    /// Register a wrapper for every entry of [`PUSH_COMMANDS`]
    pub fn register() -> Self {
        Self {
            wrappers: PUSH_COMMANDS.iter().copied().map(CommandWrapper::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandWrapper> {
        self.wrappers.iter()
    }

    /// Look up a wrapper by wrapper id or by the original command id
    pub fn find(&self, id: &str) -> Result<&CommandWrapper, UnknownPushCommandError> {
        self.wrappers
            .iter()
            .find(|w| w.id == id || w.original == id)
            .ok_or_else(|| UnknownPushCommandError {
                input: id.to_string(),
                valid: PUSH_COMMANDS.join(", "),
            })
    }
}

impl Default for CommandWrappers {
    fn default() -> Self {
        Self::register()
    }
}
