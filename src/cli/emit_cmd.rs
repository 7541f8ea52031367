//! Emit command handler - feeds git integration events to the daemon's relay

use std::path::{Path, PathBuf};

use super::args::EmitAction;
use super::daemon_cmd::request;
use super::ipc::{create_ipc_client, DaemonRequest, IpcClient};
use super::presenter::Presenter;

/// Resolve a repository path on the client side, since the daemon's working
/// directory is unrelated to ours.
fn resolve_repo(repo: &Path) -> PathBuf {
    repo.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|dir| dir.join(repo))
            .unwrap_or_else(|_| repo.to_path_buf())
    })
}

/// Requests that report one integration event. Operations and commands are
/// preceded by an `open`, which the relay treats as a no-op for known
/// repositories.
pub fn emit_requests(action: EmitAction) -> Vec<DaemonRequest> {
    match action {
        EmitAction::Open { repo } => vec![DaemonRequest::Open {
            repo: resolve_repo(&repo),
        }],
        EmitAction::Op { repo, kind } => {
            let repo = resolve_repo(&repo);
            vec![
                DaemonRequest::Open { repo: repo.clone() },
                DaemonRequest::Operation { repo, kind },
            ]
        }
        EmitAction::Exec { repo, argv } => {
            let repo = resolve_repo(&repo);
            vec![
                DaemonRequest::Open { repo: repo.clone() },
                DaemonRequest::Exec { repo, args: argv },
            ]
        }
    }
}

/// Handle emit subcommand
pub async fn handle_emit_command(action: EmitAction, presenter: &Presenter) -> Result<(), String> {
    let client = create_ipc_client();
    send_all(client.as_ref(), emit_requests(action), presenter).await
}

async fn send_all(
    client: &dyn IpcClient,
    requests: Vec<DaemonRequest>,
    presenter: &Presenter,
) -> Result<(), String> {
    let mut last = None;
    for req in &requests {
        last = request(client, req).await?.message;
    }
    presenter.success(last.as_deref().unwrap_or("Event sent"));
    Ok(())
}
