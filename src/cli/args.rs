//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::SurfaceKind;

/// you-pushed - celebrate every git push
#[derive(Parser, Debug)]
#[command(name = "you-pushed")]
#[command(version)]
#[command(about = "Shows a full-screen \"YOU PUSHED\" banner whenever you push")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Run as daemon (control via: you-pushed daemon status/test/dismiss)
    #[arg(long)]
    pub daemon: bool,

    /// Workspace root to watch (repeatable, defaults to the current directory)
    #[arg(short = 'w', long = "workspace", value_name = "PATH", requires = "daemon")]
    pub workspaces: Vec<PathBuf>,

    /// Where the banner is shown (overlay falls back to desktop without Wayland)
    #[arg(short = 's', long, value_name = "KIND")]
    pub surface: Option<SurfaceArg>,

    /// Disable the git integration relay
    #[arg(long, requires = "daemon")]
    pub no_integration: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play the banner once (through the daemon if one is running)
    Test,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Send commands to running daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// Report git integration events to the running daemon
    Emit {
        #[command(subcommand)]
        action: EmitAction,
    },
    /// Run a push-like git command and report it when it succeeds
    Wrap {
        /// Command id (e.g. git.pushForce or you-pushed.git.pushForce)
        id: String,

        /// Repository to run in (defaults to the current directory)
        #[arg(short = 'C', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Arguments forwarded to the command
        #[arg(last = true)]
        args: Vec<String>,
    },
}

/// Daemon control actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonAction {
    /// Show daemon status
    Status,
    /// Show the banner now, bypassing detection
    Test,
    /// Close the banner if one is showing
    Dismiss,
}

/// Git integration events
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum EmitAction {
    /// A repository was opened
    Open {
        /// Repository root
        repo: PathBuf,
    },
    /// A git operation finished in a repository
    Op {
        /// Repository root
        repo: PathBuf,
        /// Operation kind (push, sync, pull, fetch, commit, checkout, ...)
        kind: String,
    },
    /// A raw git command ran in a repository
    Exec {
        /// Repository root
        repo: PathBuf,
        /// Git arguments, without the leading `git`
        #[arg(last = true, required = true)]
        argv: Vec<String>,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value (comma-separated for workspaces)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Surface argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SurfaceArg {
    Overlay,
    Desktop,
    Terminal,
    Html,
}

impl From<SurfaceArg> for SurfaceKind {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Overlay => SurfaceKind::Overlay,
            SurfaceArg::Desktop => SurfaceKind::Desktop,
            SurfaceArg::Terminal => SurfaceKind::Terminal,
            SurfaceArg::Html => SurfaceKind::Html,
        }
    }
}

/// Parsed daemon options
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub workspaces: Vec<PathBuf>,
    pub surface: SurfaceKind,
    pub integration: bool,
    pub html_dir: PathBuf,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "workspaces",
    "surface",
    "integration",
    "html_dir",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
