//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag
//! 2. `YOU_PUSHED_LOG` environment variable
//! 3. `log_level` in the config file
//! 4. `info`
//!
//! The merged config already applies that order, so this module only parses
//! the winning value.

use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable overriding the configured log level
pub const LOG_ENV_VAR: &str = "YOU_PUSHED_LOG";

/// Valid log level names
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Initialise the global logging subscriber. Logs go to stderr.
///
/// Call once at startup.
pub fn init_logging(level: Level) {
    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

/// Parse a log level name
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
