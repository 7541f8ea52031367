//! Relay git integration
//!
//! A git integration fed from outside the process. Editors, git hooks and
//! scripts report repositories, finished operations and raw git commands to
//! the daemon, which hands them to the relay. The bridge subscribes to the
//! relay exactly as it would to any other integration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::application::ports::{GitApi, GitIntegration, IntegrationError, Repository};
use crate::domain::detection::{GitCommandEvent, OperationEvent, OperationKind};

/// API version the relay exposes
pub const RELAY_API_VERSION: u32 = 1;

const EVENT_CAPACITY: usize = 64;

/// Relay errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Repository {0} is not open")]
    UnknownRepository(PathBuf),
}

/// Resolve a repository path the same way for every caller
fn normalize(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

/// One repository known to the relay
pub struct RelayRepository {
    root: PathBuf,
    operations: broadcast::Sender<OperationEvent>,
    commands: broadcast::Sender<GitCommandEvent>,
}

impl RelayRepository {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            operations: broadcast::channel(EVENT_CAPACITY).0,
            commands: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    /// Number of listeners currently subscribed to this repository
    pub fn listener_count(&self) -> usize {
        self.operations.receiver_count() + self.commands.receiver_count()
    }
}

impl Repository for RelayRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn operations(&self) -> Option<broadcast::Receiver<OperationEvent>> {
        Some(self.operations.subscribe())
    }

    fn commands(&self) -> Option<broadcast::Receiver<GitCommandEvent>> {
        Some(self.commands.subscribe())
    }
}

/// Control surface of the relay
pub struct RelayApi {
    repositories: Mutex<HashMap<PathBuf, Arc<RelayRepository>>>,
    opened: broadcast::Sender<Arc<dyn Repository>>,
}

impl RelayApi {
    fn new() -> Self {
        Self {
            repositories: Mutex::new(HashMap::new()),
            opened: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    fn repositories_lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<RelayRepository>>> {
        self.repositories.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start tracking a repository. Opening a tracked repository again
    /// returns the existing one without announcing it.
    pub fn open_repository(&self, root: &Path) -> Arc<RelayRepository> {
        let root = normalize(root);
        let mut repositories = self.repositories_lock();
        if let Some(existing) = repositories.get(&root) {
            return Arc::clone(existing);
        }

        let repository = Arc::new(RelayRepository::new(root.clone()));
        repositories.insert(root.clone(), Arc::clone(&repository));
        // Announced under the lock so listings and announcements agree
        let _ = self
            .opened
            .send(Arc::clone(&repository) as Arc<dyn Repository>);
        info!(repository = %root.display(), "repository opened");
        repository
    }

    /// Look up a tracked repository
    pub fn repository(&self, root: &Path) -> Result<Arc<RelayRepository>, RelayError> {
        let root = normalize(root);
        self.repositories_lock()
            .get(&root)
            .cloned()
            .ok_or(RelayError::UnknownRepository(root))
    }

    /// Report a finished operation. Returns how many listeners received it.
    pub fn operation(&self, root: &Path, kind: OperationKind) -> Result<usize, RelayError> {
        let repository = self.repository(root)?;
        debug!(repository = %repository.root.display(), %kind, "relaying operation");
        Ok(repository
            .operations
            .send(OperationEvent { kind })
            .unwrap_or(0))
    }

    /// Report a raw git command. Returns how many listeners received it.
    pub fn command(&self, root: &Path, args: Vec<String>) -> Result<usize, RelayError> {
        let repository = self.repository(root)?;
        debug!(repository = %repository.root.display(), ?args, "relaying git command");
        Ok(repository
            .commands
            .send(GitCommandEvent { args })
            .unwrap_or(0))
    }

    /// Number of tracked repositories
    pub fn len(&self) -> usize {
        self.repositories_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GitApi for RelayApi {
    fn repositories(&self) -> Vec<Arc<dyn Repository>> {
        self.repositories_lock()
            .values()
            .map(|r| Arc::clone(r) as Arc<dyn Repository>)
            .collect()
    }

    fn repository_opened(&self) -> Option<broadcast::Receiver<Arc<dyn Repository>>> {
        Some(self.opened.subscribe())
    }
}

/// Git integration fed over the daemon's IPC socket
pub struct RelayIntegration {
    ready: watch::Sender<bool>,
    api: Arc<RelayApi>,
}

impl RelayIntegration {
    pub fn new() -> Self {
        Self {
            ready: watch::channel(false).0,
            api: Arc::new(RelayApi::new()),
        }
    }

    /// The relay's control surface, for feeding events in
    pub fn relay(&self) -> Arc<RelayApi> {
        Arc::clone(&self.api)
    }

    /// Mark the relay as activated, releasing anyone waiting in `activate`
    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
        debug!("relay integration ready");
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }
}

impl Default for RelayIntegration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitIntegration for RelayIntegration {
    fn id(&self) -> &str {
        "relay"
    }

    async fn activate(&self) -> Result<(), IntegrationError> {
        let mut ready = self.ready.subscribe();
        ready
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|e| IntegrationError::ActivationFailed(e.to_string()))
    }

    fn api(&self, version: u32) -> Result<Arc<dyn GitApi>, IntegrationError> {
        if version != RELAY_API_VERSION {
            return Err(IntegrationError::UnsupportedVersion {
                requested: version,
                available: RELAY_API_VERSION,
            });
        }
        Ok(self.relay())
    }
}
