//! Git integration bridge detector
//!
//! Subscribes to an optional external git integration. For every repository
//! it tracks, now or later, two independent listeners are attached: one for
//! completed push/sync operations and one for raw `git push` commands. Both
//! may report the same push; the trigger's debounce absorbs the duplicate.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::domain::detection::DetectionSource;

use super::ports::{
    DetectionSender, DetectorError, GitIntegration, PushDetector, Repository,
};

/// Integration API version this bridge speaks
pub const BRIDGE_API_VERSION: u32 = 1;

/// Detector backed by an external git integration
pub struct GitIntegrationBridge {
    integration: Option<Arc<dyn GitIntegration>>,
    task: Option<JoinHandle<()>>,
}

impl GitIntegrationBridge {
    /// Bridge to the given integration
    pub fn new(integration: Arc<dyn GitIntegration>) -> Self {
        Self {
            integration: Some(integration),
            task: None,
        }
    }

    /// Bridge with no integration installed; starting it is a no-op
    pub fn absent() -> Self {
        Self {
            integration: None,
            task: None,
        }
    }

    /// Whether an integration is present
    pub fn has_integration(&self) -> bool {
        self.integration.is_some()
    }
}

#[async_trait]
impl PushDetector for GitIntegrationBridge {
    fn name(&self) -> String {
        match &self.integration {
            Some(integration) => format!("git-integration:{}", integration.id()),
            None => "git-integration:absent".to_string(),
        }
    }

    async fn start(&mut self, sender: DetectionSender) -> Result<(), DetectorError> {
        if self.task.is_some() {
            return Err(DetectorError::AlreadyStarted);
        }

        let Some(integration) = self.integration.clone() else {
            info!("no git integration installed, bridge disabled");
            return Ok(());
        };

        self.task = Some(tokio::spawn(run_bridge(integration, sender)));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

async fn run_bridge(integration: Arc<dyn GitIntegration>, sender: DetectionSender) {
    let id = integration.id().to_string();

    if let Err(e) = integration.activate().await {
        info!(integration = %id, error = %e, "git integration unavailable, bridge disabled");
        return;
    }
    let api = match integration.api(BRIDGE_API_VERSION) {
        Ok(api) => api,
        Err(e) => {
            info!(integration = %id, error = %e, "git integration unusable, bridge disabled");
            return;
        }
    };

    // Subscribe before listing so a repository opened in between is not lost
    let opened = api.repository_opened();

    // Dropping the set (task abort) aborts every listener
    let mut listeners = JoinSet::new();
    let mut attached = HashSet::new();
    for repository in api.repositories() {
        attach(&mut listeners, &mut attached, repository, &sender);
    }
    info!(integration = %id, repositories = attached.len(), "git integration bridge active");

    let Some(mut opened) = opened else {
        debug!(integration = %id, "integration does not report opened repositories");
        while listeners.join_next().await.is_some() {}
        return;
    };

    loop {
        tokio::select! {
            repository = opened.recv() => match repository {
                Ok(repository) => attach(&mut listeners, &mut attached, repository, &sender),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed repository-opened events");
                }
                Err(RecvError::Closed) => break,
            },
            Some(_) = listeners.join_next(), if !listeners.is_empty() => {}
        }
    }

    while listeners.join_next().await.is_some() {}
}

/// Attach the operation and command listeners to one repository.
///
/// Subscriptions are taken before returning, so no event sent after this call
/// is missed. A repository already attached is skipped.
fn attach(
    listeners: &mut JoinSet<()>,
    attached: &mut HashSet<PathBuf>,
    repository: Arc<dyn Repository>,
    sender: &DetectionSender,
) {
    let root = repository.root().to_path_buf();
    if !attached.insert(root.clone()) {
        return;
    }

    if let Some(operations) = repository.operations() {
        let sender = sender.clone();
        let root = root.clone();
        listeners.spawn(listen(operations, move |operation| {
            if operation.kind.is_push_like() {
                sender.emit(DetectionSource::Operation {
                    repository: root.clone(),
                    kind: operation.kind,
                });
            }
        }));
    }

    if let Some(commands) = repository.commands() {
        let sender = sender.clone();
        let root = root.clone();
        listeners.spawn(listen(commands, move |command| {
            if command.is_push() {
                sender.emit(DetectionSource::Command {
                    repository: root.clone(),
                    args: command.args,
                });
            }
        }));
    }

    debug!(repository = %root.display(), "attached git listeners");
}

async fn listen<T: Clone>(mut rx: broadcast::Receiver<T>, mut on_event: impl FnMut(T)) {
    loop {
        match rx.recv().await {
            Ok(event) => on_event(event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "git listener lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
