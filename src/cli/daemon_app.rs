//! Daemon app runner

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::ports::{Repository, SurfaceError};
use crate::application::{DetectorSet, GitIntegrationBridge, PushContext};
use crate::domain::detection::OperationKind;
use crate::infrastructure::{
    create_surface_factory, RelayApi, RelayError, RelayIntegration, ReflogWatcher,
};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::args::DaemonOptions;
use super::ipc::{create_ipc_server, DaemonReply, DaemonRequest, DaemonStatus, IpcServer};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::{DaemonSignal, DaemonSignalHandler};

/// Longest a surface request may hold up the reply. The work itself keeps
/// running in the background past this.
const SURFACE_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything the daemon loop answers requests from
struct Daemon {
    context: PushContext,
    detectors: DetectorSet,
    relay: Option<Arc<RelayApi>>,
}

/// Run daemon mode
pub async fn run_daemon(options: DaemonOptions) -> ExitCode {
    let presenter = Presenter::new();

    let pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let factory = create_surface_factory(options.surface, options.html_dir.clone());
    let context = PushContext::new(factory);

    // The relay must know the workspaces before any client reports events
    let integration = options.integration.then(|| Arc::new(RelayIntegration::new()));
    if let Some(integration) = &integration {
        let relay = integration.relay();
        for root in &options.workspaces {
            relay.open_repository(root);
        }
    }

    let mut detectors = DetectorSet::new();
    for root in &options.workspaces {
        detectors.add(Box::new(ReflogWatcher::new(root.clone())));
    }
    detectors.add(Box::new(match &integration {
        Some(integration) => GitIntegrationBridge::new(integration.clone()),
        None => GitIntegrationBridge::absent(),
    }));
    detectors.start(context.trigger().clone()).await;

    let (mut signals, signal_tx) = match DaemonSignalHandler::new().await {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            detectors.stop().await;
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut server = create_ipc_server();
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        detectors.stop().await;
        return ExitCode::from(EXIT_ERROR);
    }
    let server: Arc<dyn IpcServer> = Arc::from(server);
    let server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            if let Err(e) = server.run(signal_tx).await {
                warn!(error = %e, "IPC server stopped");
            }
        }
    });

    if let Some(integration) = &integration {
        integration.mark_ready();
    }

    presenter.info(&format!(
        "Watching {} workspace(s) | surface: {} | integration: {}",
        options.workspaces.len(),
        options.surface,
        if options.integration { "relay" } else { "off" }
    ));
    presenter.info(&format!(
        "PID: {} | Socket: {} | SIGINT: exit",
        std::process::id(),
        server.path()
    ));

    let mut daemon = Daemon {
        context,
        detectors,
        relay: integration.as_ref().map(|i| i.relay()),
    };
    let clean = daemon_loop(&daemon, &mut signals).await;

    info!("shutting down");
    daemon.detectors.stop().await;
    daemon.context.shutdown().await;
    server_task.abort();
    server.cleanup();
    let _ = pid_file.release();

    if clean {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Serve requests until shutdown. Returns false if the signal channel closed
/// unexpectedly.
async fn daemon_loop(daemon: &Daemon, signals: &mut DaemonSignalHandler) -> bool {
    loop {
        match signals.recv().await {
            Some(DaemonSignal::Request { request, reply }) => {
                let answer = handle_request(daemon, request).await;
                if reply.send(answer).is_err() {
                    debug!("client went away before the reply");
                }
            }
            Some(DaemonSignal::Shutdown) => return true,
            None => return false,
        }
    }
}

async fn handle_request(daemon: &Daemon, request: DaemonRequest) -> DaemonReply {
    match request {
        DaemonRequest::Status => DaemonReply::status(DaemonStatus {
            surface: daemon.context.presenter().state(),
            trigger_pending: daemon.context.trigger().is_pending(),
            detectors: daemon.detectors.active().to_vec(),
            integration: daemon.relay.is_some(),
        }),
        DaemonRequest::Test => {
            let context = daemon.context.clone();
            surface_work(async move { context.test_animation().await }).await
        }
        DaemonRequest::Dismiss => {
            let presenter = daemon.context.presenter().clone();
            surface_work(async move {
                presenter.dispose_all().await;
                Ok(())
            })
            .await
        }
        DaemonRequest::Detect { source } => {
            info!(%source, "push reported by client");
            daemon.context.trigger().trigger();
            DaemonReply::ok()
        }
        DaemonRequest::Open { repo } => match &daemon.relay {
            Some(relay) => {
                let repository = relay.open_repository(&repo);
                DaemonReply::ok_with(format!("{} open", repository.root().display()))
            }
            None => integration_disabled(),
        },
        DaemonRequest::Operation { repo, kind } => match &daemon.relay {
            Some(relay) => {
                let kind: OperationKind = kind.parse().unwrap_or_else(|e| match e {});
                delivered(relay.operation(&repo, kind))
            }
            None => integration_disabled(),
        },
        DaemonRequest::Exec { repo, args } => match &daemon.relay {
            Some(relay) => delivered(relay.command(&repo, args)),
            None => integration_disabled(),
        },
    }
}

/// Run surface work off the daemon loop and wait a bounded time for it.
///
/// A notification server that never answers must not keep the loop from
/// seeing the next request or a shutdown signal.
async fn surface_work<F>(work: F) -> DaemonReply
where
    F: Future<Output = Result<(), SurfaceError>> + Send + 'static,
{
    surface_work_within(work, SURFACE_REPLY_TIMEOUT).await
}

async fn surface_work_within<F>(work: F, limit: Duration) -> DaemonReply
where
    F: Future<Output = Result<(), SurfaceError>> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::spawn(work)).await {
        Ok(Ok(Ok(()))) => DaemonReply::ok(),
        Ok(Ok(Err(e))) => DaemonReply::error(e.to_string()),
        Ok(Err(e)) => DaemonReply::error(format!("surface task failed: {}", e)),
        Err(_) => {
            warn!(limit = ?limit, "surface still busy, replying early");
            DaemonReply::ok_with("surface is still opening")
        }
    }
}

fn delivered(result: Result<usize, RelayError>) -> DaemonReply {
    match result {
        Ok(listeners) => DaemonReply::ok_with(format!("delivered to {} listener(s)", listeners)),
        Err(e) => DaemonReply::error(e.to_string()),
    }
}

fn integration_disabled() -> DaemonReply {
    DaemonReply::error("git integration is disabled (daemon started with --no-integration)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CloseSignal, Surface, SurfaceFactory};
    use crate::domain::banner::PushBanner;
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    /// Factory stuck talking to a notification server that never answers
    struct HungFactory;

    #[async_trait]
    impl SurfaceFactory for HungFactory {
        fn name(&self) -> &'static str {
            "hung"
        }

        async fn open(
            &self,
            _banner: &PushBanner,
            _on_close: CloseSignal,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            std::future::pending().await
        }
    }

    fn daemon() -> Daemon {
        Daemon {
            context: PushContext::new(Arc::new(HungFactory)),
            detectors: DetectorSet::new(),
            relay: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_surface_work_replies_after_limit() {
        let reply = surface_work_within(std::future::pending(), Duration::from_millis(50)).await;
        assert!(reply.ok);
        assert_eq!(reply.message.as_deref(), Some("surface is still opening"));
    }

    #[tokio::test]
    async fn surface_errors_are_reported() {
        let reply = surface_work_within(
            async { Err(SurfaceError::Unavailable("no display".into())) },
            Duration::from_secs(1),
        )
        .await;
        assert!(!reply.ok);
        assert!(reply.message.unwrap().contains("no display"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_show_does_not_block_shutdown() {
        let daemon = daemon();
        let (mut signals, tx) = DaemonSignalHandler::new().await.unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(DaemonSignal::Request {
            request: DaemonRequest::Test,
            reply: reply_tx,
        })
        .await
        .unwrap();
        tx.send(DaemonSignal::Shutdown).await.unwrap();

        assert!(daemon_loop(&daemon, &mut signals).await);
        assert!(reply_rx.await.unwrap().ok);
    }

    #[tokio::test]
    async fn relay_requests_need_integration() {
        let reply = handle_request(
            &daemon(),
            DaemonRequest::Open {
                repo: "/work/app".into(),
            },
        )
        .await;
        assert!(!reply.ok);
        assert!(reply.message.unwrap().contains("disabled"));
    }
}
