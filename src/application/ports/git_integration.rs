//! Git integration port interface
//!
//! Models an external git integration (an editor's git support, a hook relay)
//! whose events the bridge subscribes to. Every capability is optional: an
//! integration may not expose a repository-opened stream, and a repository
//! may not expose operation or command events.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::detection::{GitCommandEvent, OperationEvent};

/// Integration errors
#[derive(Debug, Clone, Error)]
pub enum IntegrationError {
    #[error("Git integration '{0}' is not available")]
    NotAvailable(String),

    #[error("Git integration failed to activate: {0}")]
    ActivationFailed(String),

    #[error("Git integration API version {requested} is not supported (available: {available})")]
    UnsupportedVersion { requested: u32, available: u32 },
}

/// A repository tracked by the integration
pub trait Repository: Send + Sync {
    /// Repository root
    fn root(&self) -> &Path;

    /// Stream of completed operations, if the integration reports them
    fn operations(&self) -> Option<broadcast::Receiver<OperationEvent>>;

    /// Stream of raw git commands, if the integration reports them
    fn commands(&self) -> Option<broadcast::Receiver<GitCommandEvent>>;
}

/// Control surface of an activated integration
pub trait GitApi: Send + Sync {
    /// Repositories currently tracked
    fn repositories(&self) -> Vec<Arc<dyn Repository>>;

    /// Stream of repositories opened from now on
    fn repository_opened(&self) -> Option<broadcast::Receiver<Arc<dyn Repository>>>;
}

/// Port for an optional external git integration
#[async_trait]
pub trait GitIntegration: Send + Sync {
    /// Identifier for logs
    fn id(&self) -> &str;

    /// Wait until the integration is activated and ready.
    async fn activate(&self) -> Result<(), IntegrationError>;

    /// Obtain the control surface for the requested API version.
    fn api(&self, version: u32) -> Result<Arc<dyn GitApi>, IntegrationError>;
}
