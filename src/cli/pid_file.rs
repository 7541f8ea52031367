//! PID file management for daemon mode

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, info};

const PID_FILE_NAME: &str = "you-pushed.pid";

/// PID file for daemon mode
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create a PID file manager in XDG_RUNTIME_DIR (or the temp dir)
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(PID_FILE_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(PID_FILE_NAME));
        Self { path }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the PID file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Check if another daemon is already running.
    ///
    /// A PID file naming a dead process is removed.
    pub fn is_running(&self) -> Option<u32> {
        let mut file = File::open(&self.path).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;
        let pid: u32 = contents.trim().parse().ok()?;

        // Signal 0 only checks that the process exists
        match kill(Pid::from_raw(pid as i32), None::<Signal>) {
            Ok(()) => Some(pid),
            Err(Errno::EPERM) => Some(pid),
            Err(Errno::ESRCH) => {
                info!(pid, path = %self.path.display(), "removing stale PID file");
                let _ = fs::remove_file(&self.path);
                None
            }
            Err(_) => None,
        }
    }

    /// Acquire the PID file (fails if another daemon is running)
    pub fn acquire(&self) -> Result<(), PidFileError> {
        if let Some(pid) = self.is_running() {
            return Err(PidFileError::AlreadyRunning(pid));
        }

        let mut file = File::create(&self.path).map_err(|e| {
            PidFileError::WriteFailed(format!("Failed to create PID file: {}", e))
        })?;

        let pid = process::id();
        write!(file, "{}", pid)
            .map_err(|e| PidFileError::WriteFailed(format!("Failed to write PID: {}", e)))?;

        debug!(pid, path = %self.path.display(), "PID file acquired");
        Ok(())
    }

    /// Release the PID file
    pub fn release(&self) -> Result<(), PidFileError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                PidFileError::RemoveFailed(format!("Failed to remove PID file: {}", e))
            })?;
        }
        Ok(())
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another daemon is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}
