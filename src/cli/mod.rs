//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, logging setup, signal
//! handling, daemon IPC and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod daemon_app;
pub mod daemon_cmd;
pub mod emit_cmd;
pub mod ipc;
pub mod logging;
pub mod pid_file;
pub mod presenter;
pub mod signals;
pub mod wrap_cmd;

// Re-export commonly used types
pub use app::{load_merged_config, run_test, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, DaemonAction, DaemonOptions, EmitAction};
pub use daemon_app::run_daemon;
pub use daemon_cmd::handle_daemon_command;
pub use presenter::Presenter;
