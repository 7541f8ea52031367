//! Unix Domain Socket communication for daemon control

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{decode_line, encode_line, DaemonReply, DaemonRequest, IpcClient, IpcServer};
use crate::cli::signals::DaemonSignal;

const SOCKET_NAME: &str = "you-pushed.sock";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(SOCKET_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(SOCKET_NAME));
        Self { path }
    }

    /// Use an explicit socket path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the socket path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if socket file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Unix Domain Socket server for daemon commands
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    /// Create a new socket server
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[async_trait]
impl IpcServer for UnixSocketServer {
    fn bind(&mut self) -> io::Result<()> {
        // Remove stale socket file if it exists
        self.socket_path.cleanup()?;

        let listener = UnixListener::bind(self.socket_path.path())?;
        self.listener = Some(listener);
        Ok(())
    }

    fn path(&self) -> String {
        self.socket_path.path().to_string_lossy().to_string()
    }

    async fn run(&self, tx: mpsc::Sender<DaemonSignal>) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, tx).await {
                            warn!(error = %e, "socket connection error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "socket accept error"),
            }
        }
    }

    fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

/// Handle a single client connection
async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<DaemonSignal>) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader.read_line(&mut line).await?;

    let reply = match decode_line::<DaemonRequest>(&line) {
        Ok(request) => {
            debug!(?request, "ipc request");
            dispatch(request, &tx).await
        }
        Err(e) => DaemonReply::error(format!("invalid request: {}", e)),
    };

    writer.write_all(encode_line(&reply)?.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

/// Hand a request to the daemon loop and wait for its reply
async fn dispatch(request: DaemonRequest, tx: &mpsc::Sender<DaemonSignal>) -> DaemonReply {
    let (reply_tx, reply_rx) = oneshot::channel();
    let signal = DaemonSignal::Request {
        request,
        reply: reply_tx,
    };
    if tx.send(signal).await.is_err() {
        return DaemonReply::error("daemon is shutting down");
    }
    reply_rx
        .await
        .unwrap_or_else(|_| DaemonReply::error("daemon is shutting down"))
}

/// Unix Domain Socket client for sending commands to daemon
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    /// Create a new socket client
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }
}

#[async_trait]
impl IpcClient for UnixSocketClient {
    fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn send(&self, request: &DaemonRequest) -> io::Result<DaemonReply> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        writer.write_all(encode_line(request)?.as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        reader.read_line(&mut response).await?;

        decode_line(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ipc::DaemonStatus;
    use crate::domain::SurfaceState;

    #[test]
    fn socket_path_uses_xdg_runtime_dir() {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("you-pushed.sock"))
            .unwrap_or_else(|_| std::env::temp_dir().join("you-pushed.sock"));

        let socket_path = SocketPath::new();
        assert_eq!(socket_path.path(), path.as_path());
    }

    #[tokio::test]
    async fn request_round_trips_through_daemon_loop() {
        let dir = tempfile::tempdir().unwrap();
        let socket = SocketPath::at(dir.path().join("test.sock"));

        let mut server = UnixSocketServer::new(socket.clone());
        server.bind().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let server_task = tokio::spawn(async move { server.run(tx).await });

        // Stand-in daemon loop
        tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                if let DaemonSignal::Request { request, reply } = signal {
                    let answer = match request {
                        DaemonRequest::Status => DaemonReply::status(DaemonStatus {
                            surface: SurfaceState::Absent,
                            trigger_pending: true,
                            detectors: vec![],
                            integration: false,
                        }),
                        other => DaemonReply::error(format!("unexpected {:?}", other)),
                    };
                    let _ = reply.send(answer);
                }
            }
        });

        let client = UnixSocketClient::new(socket);
        assert!(client.is_daemon_running());
        let reply = client.send(&DaemonRequest::Status).await.unwrap();
        assert!(reply.ok);
        assert!(reply.status.unwrap().trigger_pending);

        let reply = client.send(&DaemonRequest::Dismiss).await.unwrap();
        assert!(!reply.ok);

        server_task.abort();
    }

    #[tokio::test]
    async fn malformed_request_gets_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let socket = SocketPath::at(dir.path().join("test.sock"));

        let mut server = UnixSocketServer::new(socket.clone());
        server.bind().unwrap();
        let (tx, _rx) = mpsc::channel(4);
        let server_task = tokio::spawn(async move { server.run(tx).await });

        let stream = UnixStream::connect(socket.path()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer.write_all(b"toggle\n").await.unwrap();

        let mut response = String::new();
        BufReader::new(reader).read_line(&mut response).await.unwrap();
        let reply: DaemonReply = decode_line(&response).unwrap();
        assert!(!reply.ok);
        assert!(reply.message.unwrap().starts_with("invalid request"));

        server_task.abort();
    }

    #[tokio::test]
    async fn client_without_daemon_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let client = UnixSocketClient::new(SocketPath::at(dir.path().join("absent.sock")));
        assert!(!client.is_daemon_running());
        assert!(client.send(&DaemonRequest::Status).await.is_err());
    }
}
