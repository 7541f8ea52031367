//! HTML file surface
//!
//! Writes the banner document to a file for a browser or overlay to pick up.
//! Each surface gets its own file so a late dispose can never remove a newer
//! banner. Deleting or renaming the page counts as closing the banner.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::close_watch::CloseWatch;
use crate::application::ports::{CloseSignal, Surface, SurfaceError, SurfaceFactory};
use crate::domain::banner::PushBanner;

/// Whether the event takes the page away from its path
fn removes_page(event: &Event, page: &Path) -> bool {
    let gone = matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    gone && event
        .paths
        .iter()
        .any(|path| path.file_name() == page.file_name())
}

/// Watch the page's directory and report once the page disappears
fn watch_page(page: &Path) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let target = page.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if removes_page(&event, &target) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "banner page watch error"),
        },
        Config::default(),
    )?;

    let dir = page.parent().unwrap_or_else(|| Path::new("."));
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

/// Writes banner pages into a directory
#[derive(Debug)]
pub struct HtmlSurfaceFactory {
    dir: PathBuf,
    next: AtomicU64,
}

impl HtmlSurfaceFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: AtomicU64::new(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn page_path(&self) -> PathBuf {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        self.dir
            .join(format!("you-pushed-{}-{}.html", std::process::id(), n))
    }
}

#[async_trait]
impl SurfaceFactory for HtmlSurfaceFactory {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn open(
        &self,
        banner: &PushBanner,
        on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SurfaceError::Unavailable(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.page_path();
        fs::write(&path, &banner.html)
            .await
            .map_err(|e| SurfaceError::ShowFailed(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "banner page written");

        let (watcher, close) = match watch_page(&path) {
            Ok((watcher, mut removed)) => {
                let close =
                    CloseWatch::spawn(async move { removed.recv().await.is_some() }, on_close);
                (Some(watcher), Some(close))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot watch banner page");
                (None, None)
            }
        };

        Ok(Box::new(HtmlSurface {
            path,
            watcher: Mutex::new(watcher),
            close,
        }))
    }
}

struct HtmlSurface {
    path: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
    close: Option<CloseWatch>,
}

#[async_trait]
impl Surface for HtmlSurface {
    async fn dispose(&self) -> Result<(), SurfaceError> {
        // Our own removal must not look like an external close
        if let Some(close) = &self.close {
            close.cancel();
        }
        drop(self.watcher.lock().unwrap_or_else(|e| e.into_inner()).take());

        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "banner page removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SurfaceError::DisposeFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind, RenameMode};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn close_flag() -> (Arc<AtomicBool>, CloseSignal) {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        (fired, CloseSignal::new(move || flag.store(true, Ordering::SeqCst)))
    }

    async fn wait_for(fired: &AtomicBool, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if fired.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        fired.load(Ordering::SeqCst)
    }

    #[test]
    fn only_removal_of_the_page_counts() {
        let page = Path::new("/run/user/1000/you-pushed-1-1.html");
        let other = PathBuf::from("/run/user/1000/you-pushed-1-2.html");

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(page.to_path_buf());
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(page.to_path_buf());
        assert!(removes_page(&removed, page));
        assert!(removes_page(&renamed, page));

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(page.to_path_buf());
        let sibling = Event::new(EventKind::Remove(RemoveKind::File)).add_path(other);
        assert!(!removes_page(&created, page));
        assert!(!removes_page(&sibling, page));
    }

    #[tokio::test]
    async fn deleting_the_page_closes_the_banner() {
        let dir = tempfile::tempdir().unwrap();
        let factory = HtmlSurfaceFactory::new(dir.path());
        let (fired, signal) = close_flag();

        let surface = factory.open(&PushBanner::render(), signal).await.unwrap();
        let page = html_files(dir.path()).remove(0);
        std::fs::remove_file(&page).unwrap();

        assert!(wait_for(&fired, Duration::from_secs(3)).await);
        surface.dispose().await.unwrap();
    }

    #[tokio::test]
    async fn dispose_is_not_an_external_close() {
        let dir = tempfile::tempdir().unwrap();
        let factory = HtmlSurfaceFactory::new(dir.path());
        let (fired, signal) = close_flag();

        let surface = factory.open(&PushBanner::render(), signal).await.unwrap();
        surface.dispose().await.unwrap();

        assert!(html_files(dir.path()).is_empty());
        assert!(!wait_for(&fired, Duration::from_millis(300)).await);
    }

    fn html_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
            .collect()
    }

    #[tokio::test]
    async fn open_writes_page_and_dispose_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let factory = HtmlSurfaceFactory::new(dir.path());
        let banner = PushBanner::render();

        let surface = factory.open(&banner, CloseSignal::noop()).await.unwrap();
        let files = html_files(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), banner.html);

        surface.dispose().await.unwrap();
        assert!(html_files(dir.path()).is_empty());
        surface.dispose().await.unwrap();
    }

    #[tokio::test]
    async fn each_surface_gets_its_own_page() {
        let dir = tempfile::tempdir().unwrap();
        let factory = HtmlSurfaceFactory::new(dir.path());
        let banner = PushBanner::render();

        let first = factory.open(&banner, CloseSignal::noop()).await.unwrap();
        let _second = factory.open(&banner, CloseSignal::noop()).await.unwrap();
        assert_eq!(html_files(dir.path()).len(), 2);

        first.dispose().await.unwrap();
        assert_eq!(html_files(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let factory = HtmlSurfaceFactory::new(&nested);

        factory
            .open(&PushBanner::render(), CloseSignal::noop())
            .await
            .unwrap();
        assert_eq!(html_files(&nested).len(), 1);
    }
}
