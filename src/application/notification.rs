//! Notification presenter use case
//!
//! Owns the single live notification surface. Showing replaces any live
//! surface, every surface is dismissed automatically after the display
//! duration, and externally closed surfaces are forgotten so they are never
//! disposed twice.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::banner::{PushBanner, DISPLAY_DURATION};
use crate::domain::surface::SurfaceState;

use super::ports::{CloseSignal, Surface, SurfaceError, SurfaceFactory};

struct LiveSurface {
    id: u64,
    surface: Box<dyn Surface>,
}

#[derive(Default)]
struct PresenterState {
    live: Option<LiveSurface>,
    dismiss: Option<JoinHandle<()>>,
    /// Id of the most recent show; a show whose id is no longer current
    /// must not install its surface.
    generation: u64,
}

fn lock(state: &Mutex<PresenterState>) -> MutexGuard<'_, PresenterState> {
    // Lock is brief and never held across an await
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shows the banner on a single surface at a time
#[derive(Clone)]
pub struct NotificationPresenter {
    factory: Arc<dyn SurfaceFactory>,
    state: Arc<Mutex<PresenterState>>,
    display: Duration,
}

impl NotificationPresenter {
    /// Create a presenter that dismisses surfaces after [`DISPLAY_DURATION`]
    pub fn new(factory: Arc<dyn SurfaceFactory>) -> Self {
        Self::with_display_duration(factory, DISPLAY_DURATION)
    }

    /// Create with a custom display duration
    pub fn with_display_duration(factory: Arc<dyn SurfaceFactory>, display: Duration) -> Self {
        Self {
            factory,
            state: Arc::new(Mutex::new(PresenterState::default())),
            display,
        }
    }

    /// Name of the surface factory in use
    pub fn surface_name(&self) -> &'static str {
        self.factory.name()
    }

    /// Current surface state
    pub fn state(&self) -> SurfaceState {
        if lock(&self.state).live.is_some() {
            SurfaceState::Shown
        } else {
            SurfaceState::Absent
        }
    }

    /// Show the banner, replacing any live surface.
    pub async fn show(&self) -> Result<(), SurfaceError> {
        let (previous, id) = {
            let mut state = lock(&self.state);
            state.generation += 1;
            if let Some(timer) = state.dismiss.take() {
                timer.abort();
            }
            (state.live.take(), state.generation)
        };

        if let Some(previous) = previous {
            debug!(id = previous.id, "replacing live surface");
            dispose_quietly(previous).await;
        }

        let banner = PushBanner::with_lifetime(self.display);
        let surface = self.factory.open(&banner, self.close_signal(id)).await?;

        let stale = {
            let mut state = lock(&self.state);
            if state.generation == id {
                state.live = Some(LiveSurface { id, surface });
                state.dismiss = Some(self.spawn_dismiss(id));
                None
            } else {
                Some(LiveSurface { id, surface })
            }
        };

        match stale {
            Some(stale) => {
                debug!(id, "newer show started while opening, discarding surface");
                dispose_quietly(stale).await;
            }
            None => info!(id, surface = self.factory.name(), "banner shown"),
        }

        Ok(())
    }

    /// Dispose the live surface and cancel its pending auto-dismiss.
    pub async fn dispose_all(&self) {
        let (live, timer) = {
            let mut state = lock(&self.state);
            state.generation += 1;
            (state.live.take(), state.dismiss.take())
        };

        if let Some(timer) = timer {
            timer.abort();
        }
        if let Some(live) = live {
            debug!(id = live.id, "disposing live surface");
            dispose_quietly(live).await;
        }
    }

    fn spawn_dismiss(&self, id: u64) -> JoinHandle<()> {
        let state = Arc::downgrade(&self.state);
        let display = self.display;

        tokio::spawn(async move {
            tokio::time::sleep(display).await;

            let Some(state) = state.upgrade() else {
                return;
            };
            let expired = {
                let mut state = lock(&state);
                if state.live.as_ref().map(|live| live.id) == Some(id) {
                    state.dismiss = None;
                    state.live.take()
                } else {
                    None
                }
            };

            if let Some(expired) = expired {
                debug!(id, "auto-dismissing surface");
                dispose_quietly(expired).await;
            }
        })
    }

    fn close_signal(&self, id: u64) -> CloseSignal {
        let state = Arc::downgrade(&self.state);

        CloseSignal::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let closed = {
                let mut state = lock(&state);
                if state.live.as_ref().map(|live| live.id) == Some(id) {
                    state.live.take()
                } else {
                    None
                }
            };
            if closed.is_some() {
                debug!(id, "surface closed externally");
            }
        })
    }
}

async fn dispose_quietly(live: LiveSurface) {
    if let Err(e) = live.surface.dispose().await {
        warn!(id = live.id, error = %e, "failed to dispose surface");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        opened: AtomicUsize,
        disposed: AtomicUsize,
        closed: AtomicUsize,
        overlapped: AtomicBool,
        closers: Mutex<Vec<CloseSignal>>,
        banners: Mutex<Vec<PushBanner>>,
    }

    impl Recorder {
        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        fn disposed(&self) -> usize {
            self.disposed.load(Ordering::SeqCst)
        }

        fn close_latest(&self) {
            let closer = self.closers.lock().unwrap().pop().unwrap();
            self.closed.fetch_add(1, Ordering::SeqCst);
            closer.fire();
        }
    }

    struct MockSurface {
        recorder: Arc<Recorder>,
        disposed: AtomicBool,
    }

    #[async_trait]
    impl Surface for MockSurface {
        async fn dispose(&self) -> Result<(), SurfaceError> {
            if !self.disposed.swap(true, Ordering::SeqCst) {
                self.recorder.disposed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    struct MockFactory {
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl SurfaceFactory for MockFactory {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn open(
            &self,
            banner: &PushBanner,
            on_close: CloseSignal,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            let r = &self.recorder;
            let live = r.opened() - r.disposed() - r.closed.load(Ordering::SeqCst);
            if live > 0 {
                r.overlapped.store(true, Ordering::SeqCst);
            }
            r.opened.fetch_add(1, Ordering::SeqCst);
            r.closers.lock().unwrap().push(on_close);
            r.banners.lock().unwrap().push(banner.clone());
            Ok(Box::new(MockSurface {
                recorder: Arc::clone(r),
                disposed: AtomicBool::new(false),
            }))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl SurfaceFactory for FailingFactory {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn open(
            &self,
            _banner: &PushBanner,
            _on_close: CloseSignal,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            Err(SurfaceError::Unavailable("no display".into()))
        }
    }

    fn presenter() -> (NotificationPresenter, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let factory = MockFactory {
            recorder: Arc::clone(&recorder),
        };
        (NotificationPresenter::new(Arc::new(factory)), recorder)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn show_opens_surface_with_banner() {
        let (presenter, recorder) = presenter();
        assert_eq!(presenter.state(), SurfaceState::Absent);

        presenter.show().await.unwrap();

        assert_eq!(presenter.state(), SurfaceState::Shown);
        assert_eq!(recorder.opened(), 1);
        assert_eq!(recorder.banners.lock().unwrap()[0], PushBanner::render());
    }

    #[tokio::test(start_paused = true)]
    async fn banner_lifetime_follows_display_duration() {
        let recorder = Arc::new(Recorder::default());
        let factory = MockFactory {
            recorder: Arc::clone(&recorder),
        };
        let presenter = NotificationPresenter::with_display_duration(Arc::new(factory), ms(1500));

        presenter.show().await.unwrap();

        let banner = recorder.banners.lock().unwrap()[0].clone();
        assert_eq!(banner.lifetime, ms(1500));
        assert_eq!(banner.animation_millis(), Some(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn show_disposes_previous_surface_first() {
        let (presenter, recorder) = presenter();

        presenter.show().await.unwrap();
        presenter.show().await.unwrap();
        presenter.show().await.unwrap();

        assert_eq!(recorder.opened(), 3);
        assert_eq!(recorder.disposed(), 2);
        assert!(!recorder.overlapped.load(Ordering::SeqCst));
        assert_eq!(presenter.state(), SurfaceState::Shown);
    }

    #[tokio::test(start_paused = true)]
    async fn surface_auto_dismisses_at_display_duration() {
        let (presenter, recorder) = presenter();
        presenter.show().await.unwrap();

        tokio::time::sleep(ms(4999)).await;
        assert_eq!(presenter.state(), SurfaceState::Shown);
        assert_eq!(recorder.disposed(), 0);

        tokio::time::sleep(ms(2)).await;
        assert_eq!(presenter.state(), SurfaceState::Absent);
        assert_eq!(recorder.disposed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn external_close_clears_state_and_timer_fires_harmlessly() {
        let (presenter, recorder) = presenter();
        presenter.show().await.unwrap();

        tokio::time::sleep(ms(1000)).await;
        recorder.close_latest();
        assert_eq!(presenter.state(), SurfaceState::Absent);

        tokio::time::sleep(ms(5000)).await;
        assert_eq!(presenter.state(), SurfaceState::Absent);
        assert_eq!(recorder.disposed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_close_signal_does_not_clear_newer_surface() {
        let (presenter, recorder) = presenter();
        presenter.show().await.unwrap();
        let first_closer = recorder.closers.lock().unwrap().remove(0);

        presenter.show().await.unwrap();
        first_closer.fire();

        assert_eq!(presenter.state(), SurfaceState::Shown);
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_timer_never_dismisses_newer_surface() {
        let (presenter, recorder) = presenter();
        presenter.show().await.unwrap();

        tokio::time::sleep(ms(3000)).await;
        presenter.show().await.unwrap();

        // First surface's timer would have fired at 5000
        tokio::time::sleep(ms(2500)).await;
        assert_eq!(presenter.state(), SurfaceState::Shown);
        assert_eq!(recorder.disposed(), 1);

        tokio::time::sleep(ms(2501)).await;
        assert_eq!(presenter.state(), SurfaceState::Absent);
        assert_eq!(recorder.disposed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_all_disposes_and_cancels_timer() {
        let (presenter, recorder) = presenter();
        presenter.show().await.unwrap();

        presenter.dispose_all().await;
        assert_eq!(presenter.state(), SurfaceState::Absent);
        assert_eq!(recorder.disposed(), 1);

        tokio::time::sleep(ms(6000)).await;
        assert_eq!(recorder.disposed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_all_without_surface_is_noop() {
        let (presenter, recorder) = presenter();
        presenter.dispose_all().await;
        presenter.dispose_all().await;
        assert_eq!(recorder.disposed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_open_leaves_state_absent() {
        let presenter = NotificationPresenter::new(Arc::new(FailingFactory));
        let err = presenter.show().await.unwrap_err();
        assert!(err.to_string().contains("no display"));
        assert_eq!(presenter.state(), SurfaceState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_display_duration() {
        let recorder = Arc::new(Recorder::default());
        let factory = MockFactory {
            recorder: Arc::clone(&recorder),
        };
        let presenter = NotificationPresenter::with_display_duration(Arc::new(factory), ms(100));
        presenter.show().await.unwrap();

        tokio::time::sleep(ms(101)).await;
        assert_eq!(presenter.state(), SurfaceState::Absent);
    }
}
