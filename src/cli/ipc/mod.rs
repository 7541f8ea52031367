//! IPC (Inter-Process Communication) module for daemon control
//!
//! One JSON request line and one JSON reply line per connection, over a Unix
//! domain socket.

mod unix_socket;

pub use unix_socket::{SocketPath, UnixSocketClient, UnixSocketServer};

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::signals::DaemonSignal;
use crate::domain::SurfaceState;

/// Requests the daemon understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DaemonRequest {
    /// Report daemon status
    Status,
    /// Show the banner now
    Test,
    /// Close the banner if one is showing
    Dismiss,
    /// A push was detected outside the daemon (e.g. by a wrapped command)
    Detect { source: String },
    /// A repository was opened in the git integration
    Open { repo: PathBuf },
    /// A git operation finished
    Operation { repo: PathBuf, kind: String },
    /// A raw git command ran
    Exec { repo: PathBuf, args: Vec<String> },
}

/// Snapshot of the running daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub surface: SurfaceState,
    pub trigger_pending: bool,
    pub detectors: Vec<String>,
    pub integration: bool,
}

/// Reply to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DaemonStatus>,
}

impl DaemonReply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
            status: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            status: None,
        }
    }

    pub fn status(status: DaemonStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::ok()
        }
    }
}

/// Encode a message as one JSON line
pub fn encode_line<T: Serialize>(message: &T) -> io::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one JSON line
pub fn decode_line<T: for<'de> Deserialize<'de>>(line: &str) -> io::Result<T> {
    serde_json::from_str(line.trim()).map_err(io::Error::from)
}

/// Trait for IPC servers that listen for daemon commands
#[async_trait::async_trait]
pub trait IpcServer: Send + Sync {
    /// Bind to the IPC endpoint
    fn bind(&mut self) -> io::Result<()>;

    /// Get the path/name of the IPC endpoint
    fn path(&self) -> String;

    /// Accept and handle connections
    ///
    /// Each request is forwarded to the daemon loop through `tx`, and the
    /// loop's reply is written back to the client.
    async fn run(&self, tx: mpsc::Sender<DaemonSignal>) -> io::Result<()>;

    /// Cleanup IPC resources
    fn cleanup(&self);
}

/// Trait for IPC clients that send commands to the daemon
#[async_trait::async_trait]
pub trait IpcClient: Send + Sync {
    /// Check if daemon appears to be running (endpoint exists)
    fn is_daemon_running(&self) -> bool;

    /// Send a request and receive the reply
    async fn send(&self, request: &DaemonRequest) -> io::Result<DaemonReply>;
}

/// Create the IPC server at the default endpoint
pub fn create_ipc_server() -> Box<dyn IpcServer> {
    Box::new(UnixSocketServer::new(SocketPath::new()))
}

/// Create the IPC client for the default endpoint
pub fn create_ipc_client() -> Box<dyn IpcClient> {
    Box::new(UnixSocketClient::new(SocketPath::new()))
}
