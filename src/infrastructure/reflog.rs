//! Reflog watcher
//!
//! Git appends to `.git/logs/refs/remotes/<remote>/<branch>` whenever a
//! remote-tracking ref moves, which a push does. Watching that directory
//! catches pushes made from any tool, at the cost of also firing on fetches
//! that update tracking refs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notify::event::{CreateKind, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::application::ports::{DetectionSender, DetectorError, PushDetector};
use crate::domain::detection::DetectionSource;

/// Remote-tracking reflog directory, relative to a workspace root
pub const REMOTE_REFLOG_DIR: &str = ".git/logs/refs/remotes";

/// Whether a filesystem event is a reflog file being written
fn is_reflog_write(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(create) => !matches!(create, CreateKind::Folder),
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// Watches one workspace root's remote reflogs
pub struct ReflogWatcher {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl ReflogWatcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            watcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory this watcher observes
    pub fn reflog_dir(&self) -> PathBuf {
        self.root.join(REMOTE_REFLOG_DIR)
    }

    /// Whether a watch is currently registered
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

#[async_trait]
impl PushDetector for ReflogWatcher {
    fn name(&self) -> String {
        format!("reflog:{}", self.root.display())
    }

    async fn start(&mut self, sender: DetectionSender) -> Result<(), DetectorError> {
        if self.watcher.is_some() {
            return Err(DetectorError::AlreadyStarted);
        }

        let dir = self.reflog_dir();
        if !dir.is_dir() {
            info!(path = %dir.display(), "no remote reflogs, not watching");
            return Ok(());
        }

        let watch_error = |e: notify::Error| DetectorError::Watch {
            path: dir.display().to_string(),
            message: e.to_string(),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_reflog_write(&event.kind) => {
                    for path in event.paths {
                        sender.emit(DetectionSource::Reflog { path });
                    }
                }
                Ok(event) => debug!(kind = ?event.kind, "ignoring reflog event"),
                Err(e) => warn!(error = %e, "reflog watch error"),
            },
            Config::default(),
        )
        .map_err(watch_error)?;

        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .map_err(watch_error)?;

        info!(path = %dir.display(), "watching remote reflogs");
        self.watcher = Some(watcher);
        Ok(())
    }

    async fn stop(&mut self) {
        if self.watcher.take().is_some() {
            debug!(root = %self.root.display(), "reflog watch released");
        }
    }

    fn is_active(&self) -> bool {
        self.is_watching()
    }
}
