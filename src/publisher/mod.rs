//! Result publisher
//!
//! Fans session events out to any number of [`SessionObserver`]s. Observers
//! are isolated from the sequencer and from each other: an observer that
//! returns an error or panics is logged and skipped, and delivery continues.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::{AggregateResult, RunResult},
    types::Phase,
};
use serde::{Deserialize, Serialize};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc;

/// Progress inside the attempt that is currently running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptProgress {
    /// 1-based index of the running attempt
    pub run_index: usize,
    pub total_runs: usize,
    pub phase: Phase,
    /// Completion of `phase`, in `[0, 1]`
    pub fraction: f64,
}

/// Emitted once per resolved attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    /// Number of attempts resolved so far (1-based)
    pub completed_runs: usize,
    pub total_runs: usize,
    /// Result of the attempt that just resolved
    pub latest: RunResult,
    /// Rounded mean of every result collected so far
    pub partial_mean: RunResult,
}

impl RunProgress {
    /// Completed fraction of the session
    pub fn fraction(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        self.completed_runs as f64 / self.total_runs as f64
    }
}

/// Receives session events.
///
/// Every method has a no-op default so observers only implement what they need.
pub trait SessionObserver: Send + Sync {
    fn on_attempt_progress(&self, _progress: &AttemptProgress) -> Result<()> {
        Ok(())
    }

    fn on_progress(&self, _progress: &RunProgress) -> Result<()> {
        Ok(())
    }

    fn on_complete(&self, _result: &AggregateResult) -> Result<()> {
        Ok(())
    }

    fn on_failed(&self, _reason: &str) -> Result<()> {
        Ok(())
    }
}

/// Session event as a value, for channel-based consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    AttemptProgress(AttemptProgress),
    Progress(RunProgress),
    Complete(AggregateResult),
    Failed { reason: String },
}

impl SessionEvent {
    /// Whether this event ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Complete(_) | SessionEvent::Failed { .. })
    }
}

/// Observer that forwards every event into an unbounded channel
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    /// Create the observer together with its receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: SessionEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| AppError::internal("Session event receiver was dropped"))
    }
}

impl SessionObserver for ChannelObserver {
    fn on_attempt_progress(&self, progress: &AttemptProgress) -> Result<()> {
        self.send(SessionEvent::AttemptProgress(*progress))
    }

    fn on_progress(&self, progress: &RunProgress) -> Result<()> {
        self.send(SessionEvent::Progress(*progress))
    }

    fn on_complete(&self, result: &AggregateResult) -> Result<()> {
        self.send(SessionEvent::Complete(result.clone()))
    }

    fn on_failed(&self, reason: &str) -> Result<()> {
        self.send(SessionEvent::Failed { reason: reason.to_string() })
    }
}

/// An observer call that did not succeed
#[derive(Debug, Clone)]
struct ObserverFailure {
    observer: usize,
    event: &'static str,
    error: AppError,
}

/// Delivers session events to registered observers
pub struct ResultPublisher {
    observers: Vec<Arc<dyn SessionObserver>>,
    logger: Logger,
    /// Failures raised from synchronous progress callbacks, logged on the next flush
    deferred: Mutex<Vec<ObserverFailure>>,
}

impl ResultPublisher {
    pub fn new(logger: Logger) -> Self {
        Self {
            observers: Vec::new(),
            logger,
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer; events are delivered in registration order
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Builder-style [`subscribe`](Self::subscribe)
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.subscribe(observer);
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver intra-attempt progress.
    ///
    /// Called from provider progress callbacks, so it cannot await; failures
    /// are queued and written out by [`flush`](Self::flush).
    pub fn publish_attempt_progress(&self, progress: &AttemptProgress) {
        let failures = self.dispatch("attempt_progress", |observer| observer.on_attempt_progress(progress));
        if failures.is_empty() {
            return;
        }

        let mut deferred = match self.deferred.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        deferred.extend(failures);
    }

    pub async fn publish_progress(&self, progress: &RunProgress) {
        let failures = self.dispatch("progress", |observer| observer.on_progress(progress));
        self.report(failures).await;
    }

    pub async fn publish_complete(&self, result: &AggregateResult) {
        let failures = self.dispatch("complete", |observer| observer.on_complete(result));
        self.report(failures).await;
    }

    pub async fn publish_failed(&self, reason: &str) {
        let failures = self.dispatch("failed", |observer| observer.on_failed(reason));
        self.report(failures).await;
    }

    /// Log failures queued by [`publish_attempt_progress`](Self::publish_attempt_progress)
    pub async fn flush(&self) {
        let failures = {
            let mut deferred = match self.deferred.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *deferred)
        };
        self.report(failures).await;
    }

    fn dispatch<F>(&self, event: &'static str, notify: F) -> Vec<ObserverFailure>
    where
        F: Fn(&dyn SessionObserver) -> Result<()>,
    {
        let mut failures = Vec::new();

        for (index, observer) in self.observers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| notify(observer.as_ref())));

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(payload) => AppError::internal(format!(
                    "Observer panicked: {}",
                    panic_message(payload.as_ref())
                )),
            };

            failures.push(ObserverFailure { observer: index, event, error });
        }

        failures
    }

    async fn report(&self, failures: Vec<ObserverFailure>) {
        for failure in failures {
            self.logger.error("Session observer failed")
                .field("observer", failure.observer)
                .field("event", failure.event)
                .field("error", failure.error.to_string())
                .error_info(&failure.error)
                .log()
                .await;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logging::LogLevel, types::Confidence};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        progress: AtomicUsize,
        complete: AtomicUsize,
        failed: AtomicUsize,
    }

    impl SessionObserver for CountingObserver {
        fn on_progress(&self, _progress: &RunProgress) -> Result<()> {
            self.progress.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_complete(&self, _result: &AggregateResult) -> Result<()> {
            self.complete.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_failed(&self, _reason: &str) -> Result<()> {
            self.failed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingObserver;

    impl SessionObserver for FailingObserver {
        fn on_progress(&self, _progress: &RunProgress) -> Result<()> {
            Err(AppError::internal("display unavailable"))
        }

        fn on_attempt_progress(&self, _progress: &AttemptProgress) -> Result<()> {
            Err(AppError::internal("progress bar unavailable"))
        }
    }

    struct PanickingObserver;

    impl SessionObserver for PanickingObserver {
        fn on_complete(&self, _result: &AggregateResult) -> Result<()> {
            panic!("renderer crashed");
        }
    }

    fn run() -> RunResult {
        RunResult::new(22.0, 5.0, 30.0, 2.0).unwrap()
    }

    fn progress() -> RunProgress {
        RunProgress {
            completed_runs: 1,
            total_runs: 3,
            latest: run(),
            partial_mean: run(),
        }
    }

    fn aggregate() -> AggregateResult {
        AggregateResult {
            download: 22.0,
            upload: 5.0,
            ping: 30.0,
            jitter: 2.3,
            sample_count: 3,
            confidence: Confidence::Low,
            timestamp: Utc::now(),
        }
    }

    fn errors(logger: &Logger) -> Vec<crate::logging::LogEntry> {
        logger.captured()
            .into_iter()
            .filter(|entry| entry.level == LogLevel::Error)
            .collect()
    }

    #[tokio::test]
    async fn test_events_reach_every_observer() {
        let first = Arc::new(CountingObserver::default());
        let second = Arc::new(CountingObserver::default());
        let publisher = ResultPublisher::new(Logger::capturing("TEST".to_string()))
            .with_observer(first.clone())
            .with_observer(second.clone());

        publisher.publish_progress(&progress()).await;
        publisher.publish_complete(&aggregate()).await;

        for observer in [&first, &second] {
            assert_eq!(observer.progress.load(Ordering::SeqCst), 1);
            assert_eq!(observer.complete.load(Ordering::SeqCst), 1);
            assert_eq!(observer.failed.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_failing_observer_is_logged_and_skipped() {
        let logger = Logger::capturing("TEST".to_string());
        let healthy = Arc::new(CountingObserver::default());
        let publisher = ResultPublisher::new(logger.clone())
            .with_observer(Arc::new(FailingObserver))
            .with_observer(healthy.clone());

        publisher.publish_progress(&progress()).await;

        assert_eq!(healthy.progress.load(Ordering::SeqCst), 1);
        let logged = errors(&logger);
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].fields.get("event"), Some(&serde_json::json!("progress")));
    }

    #[tokio::test]
    async fn test_panicking_observer_is_contained() {
        let logger = Logger::capturing("TEST".to_string());
        let healthy = Arc::new(CountingObserver::default());
        let publisher = ResultPublisher::new(logger.clone())
            .with_observer(Arc::new(PanickingObserver))
            .with_observer(healthy.clone());

        publisher.publish_complete(&aggregate()).await;

        assert_eq!(healthy.complete.load(Ordering::SeqCst), 1);
        let logged = errors(&logger);
        assert_eq!(logged.len(), 1);
        let error = logged[0].fields.get("error").and_then(|v| v.as_str()).unwrap_or_default();
        assert!(error.contains("renderer crashed"));
    }

    #[tokio::test]
    async fn test_attempt_progress_failures_are_deferred_until_flush() {
        let logger = Logger::capturing("TEST".to_string());
        let publisher = ResultPublisher::new(logger.clone()).with_observer(Arc::new(FailingObserver));

        let update = AttemptProgress { run_index: 1, total_runs: 3, phase: Phase::Download, fraction: 0.5 };
        publisher.publish_attempt_progress(&update);
        publisher.publish_attempt_progress(&update);
        assert!(errors(&logger).is_empty());

        publisher.flush().await;
        assert_eq!(errors(&logger).len(), 2);

        publisher.flush().await;
        assert_eq!(errors(&logger).len(), 2);
    }

    #[tokio::test]
    async fn test_channel_observer_forwards_events() {
        let (observer, mut receiver) = ChannelObserver::new();
        let publisher = ResultPublisher::new(Logger::capturing("TEST".to_string()))
            .with_observer(Arc::new(observer));

        publisher.publish_progress(&progress()).await;
        publisher.publish_failed("attempt 2 failed").await;

        assert_eq!(receiver.recv().await, Some(SessionEvent::Progress(progress())));
        let last = receiver.recv().await.unwrap();
        assert!(last.is_terminal());
        assert_eq!(last, SessionEvent::Failed { reason: "attempt 2 failed".to_string() });
    }

    #[tokio::test]
    async fn test_channel_observer_reports_dropped_receiver() {
        let logger = Logger::capturing("TEST".to_string());
        let (observer, receiver) = ChannelObserver::new();
        drop(receiver);
        let publisher = ResultPublisher::new(logger.clone()).with_observer(Arc::new(observer));

        publisher.publish_failed("cancelled").await;
        assert_eq!(errors(&logger).len(), 1);
    }

    #[test]
    fn test_run_progress_fraction() {
        assert!((progress().fraction() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_session_event_serialization() {
        let json = serde_json::to_string(&SessionEvent::Failed { reason: "timeout".to_string() }).unwrap();
        assert!(json.contains("\"event\":\"failed\""));
    }
}
