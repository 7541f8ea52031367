//! Detector dispatcher
//!
//! Starts every registered detector, funnels their detections into the push
//! trigger in emission order, and tears everything down on stop.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::{DetectionSender, PushDetector};
use super::trigger::PushTrigger;

/// A set of detectors feeding one trigger
#[derive(Default)]
pub struct DetectorSet {
    detectors: Vec<Box<dyn PushDetector>>,
    active: Vec<String>,
    forwarder: Option<JoinHandle<()>>,
}

impl DetectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detector. Takes effect on the next `start`.
    pub fn add(&mut self, detector: Box<dyn PushDetector>) {
        self.detectors.push(detector);
    }

    /// Builder-style `add`
    pub fn with(mut self, detector: Box<dyn PushDetector>) -> Self {
        self.add(detector);
        self
    }

    /// Number of registered detectors
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Names of detectors that started and hold a live watch
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// Start all detectors and forward their detections to `trigger`.
    ///
    /// A detector that fails to start is logged and skipped; the others keep
    /// running.
    pub async fn start(&mut self, trigger: PushTrigger) {
        let (sender, mut rx) = DetectionSender::channel();

        self.active.clear();
        for detector in &mut self.detectors {
            let name = detector.name();
            match detector.start(sender.clone()).await {
                Ok(()) if detector.is_active() => {
                    debug!(detector = %name, "detector started");
                    self.active.push(name);
                }
                Ok(()) => debug!(detector = %name, "detector has nothing to watch"),
                Err(e) => warn!(detector = %name, error = %e, "detector failed to start"),
            }
        }
        info!(count = self.active.len(), "push detectors running");

        if let Some(previous) = self.forwarder.take() {
            previous.abort();
        }
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(detection) = rx.recv().await {
                info!(source = %detection.source, "push detected");
                trigger.trigger();
            }
            debug!("detection forwarder finished");
        }));
    }

    /// Stop all detectors and the forwarder
    pub async fn stop(&mut self) {
        for detector in &mut self.detectors {
            detector.stop().await;
        }
        self.active.clear();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notification::NotificationPresenter;
    use crate::application::ports::{
        CloseSignal, DetectorError, Surface, SurfaceError, SurfaceFactory,
    };
    use crate::domain::banner::PushBanner;
    use crate::domain::detection::DetectionSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct MockSurface;

    #[async_trait]
    impl Surface for MockSurface {
        async fn dispose(&self) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        opened: AtomicUsize,
    }

    #[async_trait]
    impl SurfaceFactory for CountingFactory {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn open(
            &self,
            _banner: &PushBanner,
            _on_close: CloseSignal,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockSurface))
        }
    }

    /// Detector that hands its sender back to the test
    struct ManualDetector {
        slot: Arc<Mutex<Option<DetectionSender>>>,
        stopped: Arc<AtomicBool>,
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
            self.stopped.store(true, Ordering::SeqCst);
            self.slot.lock().unwrap().take();
        }
    }

    struct BrokenDetector;

    #[async_trait]
    impl PushDetector for BrokenDetector {
        fn name(&self) -> String {
            "broken".to_string()
        }

        async fn start(&mut self, _sender: DetectionSender) -> Result<(), DetectorError> {
            Err(DetectorError::Watch {
                path: "/nowhere".into(),
                message: "permission denied".into(),
            })
        }

        async fn stop(&mut self) {}
    }

    /// Detector that starts fine but never watches anything
    struct IdleDetector;

    #[async_trait]
    impl PushDetector for IdleDetector {
        fn name(&self) -> String {
            "idle".to_string()
        }

        async fn start(&mut self, _sender: DetectionSender) -> Result<(), DetectorError> {
            Ok(())
        }

        async fn stop(&mut self) {}

        fn is_active(&self) -> bool {
            false
        }
    }

    fn wrapped(name: &str) -> DetectionSource {
        DetectionSource::WrappedCommand {
            command: name.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn detections_from_all_detectors_reach_trigger() {
        let factory = Arc::new(CountingFactory::default());
        let trigger = PushTrigger::new(NotificationPresenter::new(factory.clone()));

        let first = Arc::new(Mutex::new(None));
        let second = Arc::new(Mutex::new(None));
        let mut set = DetectorSet::new()
            .with(Box::new(ManualDetector {
                slot: first.clone(),
                stopped: Arc::new(AtomicBool::new(false)),
            }))
            .with(Box::new(ManualDetector {
                slot: second.clone(),
                stopped: Arc::new(AtomicBool::new(false)),
            }));
        set.start(trigger.clone()).await;
        assert_eq!(set.active().len(), 2);

        first.lock().unwrap().as_ref().unwrap().emit(wrapped("a"));
        second.lock().unwrap().as_ref().unwrap().emit(wrapped("b"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(factory.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_detector_is_skipped() {
        let factory = Arc::new(CountingFactory::default());
        let trigger = PushTrigger::new(NotificationPresenter::new(factory.clone()));

        let slot = Arc::new(Mutex::new(None));
        let mut set = DetectorSet::new()
            .with(Box::new(BrokenDetector))
            .with(Box::new(ManualDetector {
                slot: slot.clone(),
                stopped: Arc::new(AtomicBool::new(false)),
            }));
        set.start(trigger).await;

        assert_eq!(set.len(), 2);
        assert_eq!(set.active(), &["manual".to_string()]);

        slot.lock().unwrap().as_ref().unwrap().emit(wrapped("c"));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(factory.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_detector_is_not_reported_active() {
        let factory = Arc::new(CountingFactory::default());
        let trigger = PushTrigger::new(NotificationPresenter::new(factory));

        let mut set = DetectorSet::new()
            .with(Box::new(IdleDetector))
            .with(Box::new(ManualDetector {
                slot: Arc::new(Mutex::new(None)),
                stopped: Arc::new(AtomicBool::new(false)),
            }));
        set.start(trigger).await;

        assert_eq!(set.len(), 2);
        assert_eq!(set.active(), &["manual".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_stops_every_detector() {
        let factory = Arc::new(CountingFactory::default());
        let trigger = PushTrigger::new(NotificationPresenter::new(factory));

        let stopped = Arc::new(AtomicBool::new(false));
        let mut set = DetectorSet::new().with(Box::new(ManualDetector {
            slot: Arc::new(Mutex::new(None)),
            stopped: stopped.clone(),
        }));
        set.start(trigger).await;
        set.stop().await;

        assert!(stopped.load(Ordering::SeqCst));
        assert!(set.active().is_empty());
    }
}
