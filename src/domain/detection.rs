//! Detection events and the git integration event payloads

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a push was observed. Only used for logging; every detection means
/// the same thing to the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionSource {
    /// A remote-tracking reflog file was created or modified
    Reflog { path: PathBuf },
    /// The git integration finished a push-like operation
    Operation { repository: PathBuf, kind: OperationKind },
    /// The git integration ran a raw `git push ...`
    Command { repository: PathBuf, args: Vec<String> },
    /// A wrapped push command completed successfully
    WrappedCommand { command: String },
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reflog { path } => write!(f, "reflog {}", path.display()),
            Self::Operation { repository, kind } => {
                write!(f, "{} operation in {}", kind, repository.display())
            }
            Self::Command { repository, args } => {
                write!(f, "git {} in {}", args.join(" "), repository.display())
            }
            Self::WrappedCommand { command } => write!(f, "wrapped command {}", command),
        }
    }
}

/// A push-like action was observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub source: DetectionSource,
}

impl Detection {
    pub fn new(source: DetectionSource) -> Self {
        Self { source }
    }
}

/// Operation kinds reported by a git integration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Push,
    Sync,
    Pull,
    Fetch,
    Commit,
    Checkout,
    Other(String),
}

impl OperationKind {
    /// Whether this operation sends commits to a remote
    pub fn is_push_like(&self) -> bool {
        matches!(self, Self::Push | Self::Sync)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::Sync => "sync",
            Self::Pull => "pull",
            Self::Fetch => "fetch",
            Self::Commit => "commit",
            Self::Checkout => "checkout",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "push" => Self::Push,
            "sync" => Self::Sync,
            "pull" => Self::Pull,
            "fetch" => Self::Fetch,
            "commit" => Self::Commit,
            "checkout" => Self::Checkout,
            other => Self::Other(other.to_string()),
        })
    }
}

/// "Operation executed" event from a tracked repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEvent {
    pub kind: OperationKind,
}

/// "Git command executed" event: the argument vector after `git`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandEvent {
    pub args: Vec<String>,
}

impl GitCommandEvent {
    /// Whether the first token of the command is `push`
    pub fn is_push(&self) -> bool {
        self.args.first().map(String::as_str) == Some("push")
    }
}
