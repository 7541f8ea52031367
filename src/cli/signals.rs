//! Signal handling for daemon mode

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};

use super::ipc::{DaemonReply, DaemonRequest};

/// Daemon signals
#[derive(Debug)]
pub enum DaemonSignal {
    /// A client request, answered through `reply`
    Request {
        request: DaemonRequest,
        reply: oneshot::Sender<DaemonReply>,
    },
    /// Shutdown daemon (SIGINT/SIGTERM)
    Shutdown,
}

/// Daemon signal handler
///
/// Handles OS shutdown signals (SIGINT/SIGTERM) and provides a channel
/// for receiving daemon requests from other sources (e.g., socket server).
pub struct DaemonSignalHandler {
    receiver: mpsc::Receiver<DaemonSignal>,
}

impl DaemonSignalHandler {
    /// Create a new daemon signal handler and start listening for shutdown signals.
    ///
    /// Returns the handler and a sender that can be used by other sources
    /// (like a socket server) to send requests to the daemon loop.
    pub async fn new() -> Result<(Self, mpsc::Sender<DaemonSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(16);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            sigint.recv().await;
            eprintln!("{} Received SIGINT (shutdown)", "↓".cyan());
            let _ = tx_int.send(DaemonSignal::Shutdown).await;
        });

        let tx_term = tx.clone();
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            sigterm.recv().await;
            eprintln!("{} Received SIGTERM (shutdown)", "↓".cyan());
            let _ = tx_term.send(DaemonSignal::Shutdown).await;
        });

        Ok((Self { receiver: rx }, tx))
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<DaemonSignal> {
        self.receiver.recv().await
    }
}
