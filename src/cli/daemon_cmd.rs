//! Daemon command handler - sends commands to running daemon via IPC

use super::args::DaemonAction;
use super::ipc::{create_ipc_client, DaemonReply, DaemonRequest, IpcClient};
use super::presenter::Presenter;

/// Message shown when no daemon socket exists
pub const NO_DAEMON: &str = "No daemon running. Start with: you-pushed --daemon";

/// Send one request to the running daemon, turning refusals into errors
pub async fn request(client: &dyn IpcClient, request: &DaemonRequest) -> Result<DaemonReply, String> {
    if !client.is_daemon_running() {
        return Err(NO_DAEMON.to_string());
    }

    let reply = client
        .send(request)
        .await
        .map_err(|e| format!("Failed to communicate with daemon: {}", e))?;

    if reply.ok {
        Ok(reply)
    } else {
        Err(reply
            .message
            .unwrap_or_else(|| "daemon refused the request".to_string()))
    }
}

/// Handle daemon subcommand
pub async fn handle_daemon_command(
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    let client = create_ipc_client();

    let message = match action {
        DaemonAction::Status => {
            let reply = request(client.as_ref(), &DaemonRequest::Status).await?;
            let status = reply
                .status
                .ok_or_else(|| "Daemon did not report a status".to_string())?;
            presenter.daemon_status(&status);
            return Ok(());
        }
        DaemonAction::Test => {
            request(client.as_ref(), &DaemonRequest::Test).await?;
            "Banner shown"
        }
        DaemonAction::Dismiss => {
            request(client.as_ref(), &DaemonRequest::Dismiss).await?;
            "Banner dismissed"
        }
    };

    presenter.success(message);
    Ok(())
}
