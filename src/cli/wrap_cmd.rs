//! Wrap command handler - runs a push-like git command and reports success

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ports::{CommandError, DetectionSender};
use crate::application::CommandWrappers;
use crate::domain::error::UnknownPushCommandError;
use crate::infrastructure::GitCliHost;

use super::ipc::{create_ipc_client, DaemonRequest};
use super::presenter::Presenter;

/// Wrap command errors
#[derive(Debug, Error)]
pub enum WrapError {
    #[error(transparent)]
    UnknownCommand(#[from] UnknownPushCommandError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Handle wrap subcommand
pub async fn handle_wrap_command(
    id: &str,
    dir: Option<PathBuf>,
    args: &[String],
    presenter: &mut Presenter,
) -> Result<(), WrapError> {
    let wrappers = CommandWrappers::register();
    let wrapper = wrappers.find(id)?;

    let dir = dir
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let host = GitCliHost::new(dir);
    let (sender, mut detections) = DetectionSender::channel();

    presenter.start_spinner(&format!("Running {}...", wrapper.original()));
    if let Err(e) = wrapper.invoke(&host, args, &sender).await {
        presenter.spinner_fail(&format!("{} failed", wrapper.original()));
        return Err(e.into());
    }
    presenter.spinner_success(&format!("{} succeeded", wrapper.original()));

    drop(sender);
    let client = create_ipc_client();
    while let Ok(detection) = detections.try_recv() {
        if !client.is_daemon_running() {
            presenter.warn("No daemon running, push not reported");
            break;
        }
        let request = DaemonRequest::Detect {
            source: detection.source.to_string(),
        };
        match client.send(&request).await {
            Ok(reply) if reply.ok => {}
            Ok(reply) => presenter.warn(&format!(
                "Daemon refused the report: {}",
                reply.message.unwrap_or_default()
            )),
            Err(e) => presenter.warn(&format!("Failed to report push to daemon: {}", e)),
        }
    }

    Ok(())
}
