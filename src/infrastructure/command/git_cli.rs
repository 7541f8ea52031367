//! Git CLI command host
//!
//! Runs the push-like commands as `git` processes in a working directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{CommandError, CommandHost, CommandOutput};

/// Executes host commands with the git CLI
pub struct GitCliHost {
    program: String,
    dir: PathBuf,
}

impl GitCliHost {
    /// Run `git` in the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_program("git", dir)
    }

    /// Run a different git binary
    pub fn with_program(program: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The git invocations a command id maps to. Forwarded arguments go to
    /// the final (push) step.
    fn steps(command: &str, args: &[String]) -> Result<Vec<Vec<String>>, CommandError> {
        let owned = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let push = |flags: &[&str]| {
            let mut step = owned(&["push"]);
            step.extend(owned(flags));
            step.extend(args.iter().cloned());
            step
        };

        let steps = match command {
            "git.pushForce" => vec![push(&["--force-with-lease"])],
            "git.pushTo" => vec![push(&[])],
            "git.pushWithTags" => vec![push(&["--follow-tags"])],
            "git.sync" => vec![owned(&["pull"]), push(&[])],
            "git.syncRebase" => vec![owned(&["pull", "--rebase"]), push(&[])],
            "git.publish" if args.is_empty() => {
                vec![owned(&["push", "--set-upstream", "origin", "HEAD"])]
            }
            "git.publish" => vec![push(&["--set-upstream"])],
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(steps)
    }

    async fn run(&self, command: &str, step: &[String]) -> Result<Option<i32>, CommandError> {
        debug!(program = %self.program, args = ?step, dir = %self.dir.display(), "running git");

        let output = Command::new(&self.program)
            .args(step)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::Unavailable {
                command: command.to_string(),
                message: if e.kind() == ErrorKind::NotFound {
                    format!("{} not found", self.program)
                } else {
                    e.to_string()
                },
            })?;

        if output.status.success() {
            return Ok(output.status.code());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("{} {} exited with {}", self.program, step.join(" "), output.status),
            text => text.to_string(),
        };
        Err(CommandError::Failed {
            command: command.to_string(),
            message,
        })
    }
}

#[async_trait]
impl CommandHost for GitCliHost {
    async fn execute(&self, command: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let mut code = None;
        for step in Self::steps(command, args)? {
            code = self.run(command, &step).await?;
        }
        Ok(CommandOutput { code })
    }
}
