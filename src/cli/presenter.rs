//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use super::ipc::DaemonStatus;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Whether a spinner is running
    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print daemon status
    pub fn daemon_status(&self, status: &DaemonStatus) {
        eprintln!("{} Daemon: running", "●".cyan());
        self.key_value("surface", &status.surface.to_string());
        self.key_value("trigger", if status.trigger_pending { "pending" } else { "idle" });
        self.key_value(
            "integration",
            if status.integration { "enabled" } else { "disabled" },
        );
        if status.detectors.is_empty() {
            self.key_value("detectors", "(none)");
        } else {
            for detector in &status.detectors {
                self.key_value("detector", detector);
            }
        }
    }

    /// Print a key-value pair (for config list and status)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
