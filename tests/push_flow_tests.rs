//! Push flow integration tests
//!
//! Drive the trigger, presenter and context on a paused clock with an
//! in-memory surface factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use you_pushed::application::ports::{
    CloseSignal, DetectionSender, DetectorError, PushDetector, Surface, SurfaceError,
    SurfaceFactory,
};
use you_pushed::application::{DetectorSet, PushContext};
use you_pushed::domain::banner::PushBanner;
use you_pushed::domain::{DetectionSource, SurfaceState};

/// Surface lifecycle events, in order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Opened(usize),
    Disposed(usize),
}

#[derive(Default)]
struct Journal {
    events: Mutex<Vec<(Event, Instant)>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
    closers: Mutex<Vec<CloseSignal>>,
}

impl Journal {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    fn opened(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Opened(_)))
            .count()
    }

    fn time_of(&self, event: &Event) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, at)| *at)
    }
}

struct JournalSurface {
    id: usize,
    disposed: Mutex<bool>,
    journal: Arc<Journal>,
}

#[async_trait]
impl Surface for JournalSurface {
    async fn dispose(&self) -> Result<(), SurfaceError> {
        let mut disposed = self.disposed.lock().unwrap();
        if !*disposed {
            *disposed = true;
            self.journal.live.fetch_sub(1, Ordering::SeqCst);
            self.journal
                .events
                .lock()
                .unwrap()
                .push((Event::Disposed(self.id), Instant::now()));
        }
        Ok(())
    }
}

struct JournalFactory {
    journal: Arc<Journal>,
    next: AtomicUsize,
}

impl JournalFactory {
    fn new() -> (Arc<Self>, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let factory = Arc::new(Self {
            journal: journal.clone(),
            next: AtomicUsize::new(1),
        });
        (factory, journal)
    }
}

#[async_trait]
impl SurfaceFactory for JournalFactory {
    fn name(&self) -> &'static str {
        "journal"
    }

    async fn open(
        &self,
        _banner: &PushBanner,
        on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        let live = self.journal.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.max_live.fetch_max(live, Ordering::SeqCst);
        self.journal
            .events
            .lock()
            .unwrap()
            .push((Event::Opened(id), Instant::now()));
        self.journal.closers.lock().unwrap().push(on_close);

        Ok(Box::new(JournalSurface {
            id,
            disposed: Mutex::new(false),
            journal: self.journal.clone(),
        }))
    }
}

/// Detector that hands its sender back to the test
struct ManualDetector {
    slot: Arc<Mutex<Option<DetectionSender>>>,
}

#[async_trait]
impl PushDetector for ManualDetector {
    fn name(&self) -> String {
        "manual".to_string()
    }

    async fn start(&mut self, sender: DetectionSender) -> Result<(), DetectorError> {
        *self.slot.lock().unwrap() = Some(sender);
        Ok(())
    }

    async fn stop(&mut self) {
        self.slot.lock().unwrap().take();
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test(start_paused = true)]
async fn burst_shows_once_500ms_after_last_event() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    let start = Instant::now();
    for _ in 0..4 {
        context.trigger().trigger();
        sleep(ms(300)).await;
    }
    // Last event at t=900
    sleep(ms(1000)).await;

    assert_eq!(journal.opened(), 1);
    let shown = journal.time_of(&Event::Opened(1)).unwrap();
    assert_eq!(shown - start, ms(1400));
}

#[tokio::test(start_paused = true)]
async fn spaced_events_show_once_each() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    for _ in 0..3 {
        context.trigger().trigger();
        sleep(ms(501)).await;
    }

    assert_eq!(journal.opened(), 3);
}

#[tokio::test(start_paused = true)]
async fn show_while_live_disposes_old_surface_first() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    context.test_animation().await.unwrap();
    sleep(ms(1000)).await;
    context.test_animation().await.unwrap();

    assert_eq!(
        journal.events(),
        vec![Event::Opened(1), Event::Disposed(1), Event::Opened(2)]
    );
    assert_eq!(journal.max_live.load(Ordering::SeqCst), 1);
    assert_eq!(context.presenter().state(), SurfaceState::Shown);
}

#[tokio::test(start_paused = true)]
async fn surface_auto_disposes_at_5000ms() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    let start = Instant::now();
    context.test_animation().await.unwrap();

    sleep(ms(4999)).await;
    assert_eq!(context.presenter().state(), SurfaceState::Shown);

    sleep(ms(2)).await;
    assert_eq!(context.presenter().state(), SurfaceState::Absent);
    let disposed = journal.time_of(&Event::Disposed(1)).unwrap();
    assert_eq!(disposed - start, ms(5000));
}

#[tokio::test(start_paused = true)]
async fn external_close_makes_dismiss_timer_harmless() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    context.test_animation().await.unwrap();
    sleep(ms(2000)).await;

    let closer = journal.closers.lock().unwrap().remove(0);
    closer.fire();
    assert_eq!(context.presenter().state(), SurfaceState::Absent);

    sleep(ms(4000)).await;
    assert_eq!(journal.events(), vec![Event::Opened(1)]);

    // The presenter still works afterwards
    context.test_animation().await.unwrap();
    assert_eq!(context.presenter().state(), SurfaceState::Shown);
}

#[tokio::test(start_paused = true)]
async fn test_animation_bypasses_debounce() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    let start = Instant::now();
    context.test_animation().await.unwrap();

    assert_eq!(journal.time_of(&Event::Opened(1)), Some(start));
    assert!(!context.trigger().is_pending());
}

#[tokio::test(start_paused = true)]
async fn reflog_detection_shows_banner_from_500_to_5500ms() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    let slot = Arc::new(Mutex::new(None));
    let mut detectors = DetectorSet::new().with(Box::new(ManualDetector { slot: slot.clone() }));
    detectors.start(context.trigger().clone()).await;

    let start = Instant::now();
    slot.lock()
        .unwrap()
        .as_ref()
        .unwrap()
        .emit(DetectionSource::Reflog {
            path: "/repo/.git/logs/refs/remotes/origin/main".into(),
        });

    sleep(ms(6000)).await;

    assert_eq!(journal.events(), vec![Event::Opened(1), Event::Disposed(1)]);
    assert_eq!(journal.time_of(&Event::Opened(1)).unwrap() - start, ms(500));
    assert_eq!(journal.time_of(&Event::Disposed(1)).unwrap() - start, ms(5500));

    detectors.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_and_disposes_live() {
    let (factory, journal) = JournalFactory::new();
    let context = PushContext::new(factory);

    context.test_animation().await.unwrap();
    context.trigger().trigger();
    context.shutdown().await;

    sleep(ms(10_000)).await;
    assert_eq!(journal.events(), vec![Event::Opened(1), Event::Disposed(1)]);
    assert_eq!(context.presenter().state(), SurfaceState::Absent);
}

#[tokio::test(start_paused = true)]
async fn contexts_do_not_share_state() {
    let (first_factory, first) = JournalFactory::new();
    let (second_factory, second) = JournalFactory::new();
    let a = PushContext::new(first_factory);
    let b = PushContext::new(second_factory);

    a.trigger().trigger();
    sleep(ms(600)).await;

    assert_eq!(first.opened(), 1);
    assert_eq!(second.opened(), 0);
    assert_eq!(b.presenter().state(), SurfaceState::Absent);
}
