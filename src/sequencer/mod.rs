//! Run sequencer
//!
//! Drives one test session: a fixed number of strictly sequential measurement
//! attempts with a cooldown between them. Each resolved attempt produces a
//! progress notification, and a session that collects every run is reduced
//! to a single aggregate. Any failed attempt fails the whole session and
//! no partial average is ever reported.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::{AggregateResult, Config, RunResult, SessionSnapshot, TestSession},
    provider::{MeasurementProvider, ProgressSink},
    publisher::{AttemptProgress, ResultPublisher, RunProgress},
    stats::{aggregate, partial_mean},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

/// Failure reason reported when the host cancels a session
pub const CANCELLED_REASON: &str = "cancelled";

/// Session shape, fixed for the lifetime of a sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Attempts per session
    pub total_runs: usize,
    /// Pause between consecutive attempts (not after the last one)
    pub cooldown: Duration,
    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            total_runs: crate::defaults::DEFAULT_TOTAL_RUNS,
            cooldown: crate::defaults::DEFAULT_COOLDOWN,
            attempt_timeout: crate::defaults::DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl From<&Config> for SequencerConfig {
    fn from(config: &Config) -> Self {
        Self {
            total_runs: config.total_runs,
            cooldown: config.cooldown(),
            attempt_timeout: config.attempt_timeout(),
        }
    }
}

/// How a call to [`RunSequencer::run_session`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Every attempt resolved; the aggregate has been published
    Completed {
        result: AggregateResult,
        /// Resolved runs in attempt order
        runs: Vec<RunResult>,
    },
    /// An attempt failed, timed out or the session was cancelled
    Failed { reason: String },
    /// A session was already running, so nothing happened
    Ignored,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }

    pub fn aggregate(&self) -> Option<&AggregateResult> {
        match self {
            SessionOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn runs(&self) -> &[RunResult] {
        match self {
            SessionOutcome::Completed { runs, .. } => runs,
            _ => &[],
        }
    }
}

/// Whether a session is in flight and whether it has been asked to stop.
///
/// Both flags live behind one watch lock so a cancel request can never be
/// applied to a session that has not claimed the sequencer yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Control {
    active: bool,
    cancel_requested: bool,
}

/// Releases the sequencer when a session ends, even if its future is dropped
struct ActiveGuard<'a>(&'a watch::Sender<Control>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(Control::default());
    }
}

/// Owns the lifecycle of test sessions
pub struct RunSequencer {
    provider: Arc<dyn MeasurementProvider>,
    publisher: Arc<ResultPublisher>,
    config: SequencerConfig,
    logger: Logger,
    status: watch::Sender<SessionSnapshot>,
    control: watch::Sender<Control>,
}

impl RunSequencer {
    pub fn new(
        provider: Arc<dyn MeasurementProvider>,
        publisher: Arc<ResultPublisher>,
        config: SequencerConfig,
        logger: Logger,
    ) -> Self {
        let (status, _) = watch::channel(SessionSnapshot::idle());
        let (control, _) = watch::channel(Control::default());

        Self {
            provider,
            publisher,
            config,
            logger,
            status,
            control,
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Copy of the current (or most recent) session state
    pub fn status(&self) -> SessionSnapshot {
        self.status.borrow().clone()
    }

    /// Receive every session state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.subscribe()
    }

    /// Whether a session is in flight
    pub fn is_running(&self) -> bool {
        self.control.borrow().active
    }

    /// Cancel the in-flight session, if any.
    ///
    /// The current attempt or cooldown is interrupted and the session fails with
    /// reason `"cancelled"`. Returns whether a session was signalled.
    pub fn cancel(&self) -> bool {
        let mut signalled = false;
        self.control.send_if_modified(|control| {
            signalled = control.active;
            if control.active && !control.cancel_requested {
                control.cancel_requested = true;
                return true;
            }
            false
        });
        signalled
    }

    /// Run one complete session.
    ///
    /// Returns [`SessionOutcome::Ignored`] without side effects if a session is
    /// already running. Attempt failures are reported through the outcome and
    /// the publisher, not as `Err`.
    pub async fn run_session(&self) -> Result<SessionOutcome> {
        let claimed = self.control.send_if_modified(|control| {
            if control.active {
                return false;
            }
            *control = Control { active: true, cancel_requested: false };
            true
        });
        if !claimed {
            self.logger.debug("Session already running, ignoring start request").log().await;
            return Ok(SessionOutcome::Ignored);
        }
        let _active = ActiveGuard(&self.control);

        if self.config.total_runs == 0 {
            return Err(AppError::config("A session needs at least one run"));
        }

        let mut cancel = self.control.subscribe();

        let mut session = TestSession::start(self.config.total_runs);
        self.status.send_replace(session.snapshot());

        self.logger.set_session_id(session.id().to_string()).await;
        let operation = self.logger.start_operation("speed_test_session").await;

        let outcome = match self.drive(&mut session, &mut cancel).await {
            Ok((result, runs)) => {
                session.complete();
                self.status.send_replace(session.snapshot());

                self.logger.info("Session completed")
                    .correlation_id(&operation)
                    .field("download_mbps", result.download)
                    .field("upload_mbps", result.upload)
                    .field("ping_ms", result.ping)
                    .field("jitter_ms", result.jitter)
                    .field("sample_count", result.sample_count)
                    .field("confidence", result.confidence)
                    .log()
                    .await;

                self.publisher.publish_complete(&result).await;
                SessionOutcome::Completed { result, runs }
            }
            Err(error) => {
                let reason = failure_reason(&error);
                session.fail(reason.clone());
                self.status.send_replace(session.snapshot());

                self.logger.warn("Session failed")
                    .correlation_id(&operation)
                    .field("reason", &reason)
                    .field("completed_runs", session.completed_runs().len())
                    .error_info(&error)
                    .log()
                    .await;

                self.publisher.publish_failed(&reason).await;
                SessionOutcome::Failed { reason }
            }
        };

        self.logger.end_operation(&operation, "speed_test_session", outcome.is_completed()).await;
        self.logger.clear_session_id().await;

        Ok(outcome)
    }

    async fn drive(
        &self,
        session: &mut TestSession,
        cancel: &mut watch::Receiver<Control>,
    ) -> Result<(AggregateResult, Vec<RunResult>)> {
        let total_runs = self.config.total_runs;

        for index in 0..total_runs {
            if index > 0 && !self.config.cooldown.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.cooldown) => {}
                    _ = cancelled(cancel) => return Err(AppError::cancelled(CANCELLED_REASON)),
                }
            }
            if cancel.borrow().cancel_requested {
                return Err(AppError::cancelled(CANCELLED_REASON));
            }

            let run_index = index + 1;
            self.logger.debug("Starting attempt")
                .field("run", run_index)
                .field("total_runs", total_runs)
                .log()
                .await;

            let attempt = self.run_attempt(run_index, cancel).await;
            self.publisher.flush().await;
            let result = attempt?;

            session.record(result);
            self.status.send_replace(session.snapshot());

            self.logger.info("Attempt completed")
                .field("run", run_index)
                .run_result(&result)
                .log()
                .await;

            let partial_mean = partial_mean(session.completed_runs())
                .ok_or_else(|| AppError::internal("No runs recorded after a resolved attempt"))?;

            self.publisher.publish_progress(&RunProgress {
                completed_runs: session.completed_runs().len(),
                total_runs,
                latest: result,
                partial_mean,
            }).await;
        }

        let result = aggregate(session.completed_runs())?;
        Ok((result, session.completed_runs().to_vec()))
    }

    async fn run_attempt(&self, run_index: usize, cancel: &mut watch::Receiver<Control>) -> Result<RunResult> {
        let publisher = &self.publisher;
        let total_runs = self.config.total_runs;
        let sink = ProgressSink::new(move |phase, fraction| {
            publisher.publish_attempt_progress(&AttemptProgress {
                run_index,
                total_runs,
                phase,
                fraction,
            });
        });

        let deadline = self.config.attempt_timeout;
        let attempt = tokio::time::timeout(deadline, self.provider.run_attempt(&sink));

        tokio::select! {
            outcome = attempt => match outcome {
                Ok(result) => result,
                Err(_) => Err(AppError::timeout(format!(
                    "Attempt {} did not finish within {}s",
                    run_index,
                    deadline.as_secs_f64()
                ))),
            },
            _ = cancelled(cancel) => Err(AppError::cancelled(CANCELLED_REASON)),
        }
    }
}

/// Resolves once cancellation is requested
async fn cancelled(cancel: &mut watch::Receiver<Control>) {
    let closed = cancel.wait_for(|control| control.cancel_requested).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

fn failure_reason(error: &AppError) -> String {
    match error {
        AppError::Cancelled(_) => CANCELLED_REASON.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        publisher::{ChannelObserver, SessionEvent},
        types::{Confidence, Phase, ProviderKind, SessionStatus},
    };
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
    };
    use tokio::sync::mpsc;

    /// One scripted attempt
    #[derive(Clone)]
    enum Step {
        Succeed(RunResult),
        Fail(&'static str),
        Hang,
    }

    struct ScriptedProvider {
        steps: Mutex<VecDeque<Step>>,
        delay: Duration,
        in_flight: AtomicBool,
        overlapped: AtomicBool,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Self {
            Self::with_delay(steps, Duration::ZERO)
        }

        fn with_delay(steps: Vec<Step>, delay: Duration) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                delay,
                in_flight: AtomicBool::new(false),
                overlapped: AtomicBool::new(false),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MeasurementProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Simulated
        }

        async fn run_attempt(&self, progress: &ProgressSink<'_>) -> Result<RunResult> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.calls.lock().unwrap().push(tokio::time::Instant::now());

            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Fail("script exhausted"));

            progress.report(Phase::PingJitter, 0.5);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let outcome = match step {
                Step::Succeed(result) => {
                    progress.report(Phase::Upload, 1.0);
                    Ok(result)
                }
                Step::Fail(message) => Err(AppError::measurement(message)),
                Step::Hang => std::future::pending::<Result<RunResult>>().await,
            };

            self.in_flight.store(false, Ordering::SeqCst);
            outcome
        }
    }

    fn run(download: f64, upload: f64, ping: f64, jitter: f64) -> RunResult {
        RunResult::new(download, upload, ping, jitter).unwrap()
    }

    fn three_good_runs() -> Vec<Step> {
        vec![
            Step::Succeed(run(20.0, 5.0, 30.0, 2.0)),
            Step::Succeed(run(24.0, 6.0, 28.0, 3.0)),
            Step::Succeed(run(22.0, 4.0, 32.0, 2.0)),
        ]
    }

    fn sequencer_with(
        provider: Arc<ScriptedProvider>,
        config: SequencerConfig,
    ) -> (RunSequencer, mpsc::UnboundedReceiver<SessionEvent>, Logger) {
        let logger = Logger::capturing("SEQUENCER".to_string());
        let (observer, events) = ChannelObserver::new();
        let publisher = ResultPublisher::new(logger.clone()).with_observer(Arc::new(observer));
        let sequencer = RunSequencer::new(provider, Arc::new(publisher), config, logger.clone());
        (sequencer, events, logger)
    }

    fn fast_config(total_runs: usize) -> SequencerConfig {
        SequencerConfig {
            total_runs,
            cooldown: Duration::ZERO,
            attempt_timeout: Duration::from_secs(5),
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut collected = Vec::new();
        while let Ok(event) = events.try_recv() {
            collected.push(event);
        }
        collected
    }

    fn session_events(events: &[SessionEvent]) -> Vec<&SessionEvent> {
        events
            .iter()
            .filter(|event| !matches!(event, SessionEvent::AttemptProgress(_)))
            .collect()
    }

    #[tokio::test]
    async fn test_three_runs_produce_three_progress_and_one_complete() {
        let provider = Arc::new(ScriptedProvider::new(three_good_runs()));
        let (sequencer, mut events, _) = sequencer_with(provider.clone(), fast_config(3));

        let outcome = sequencer.run_session().await.unwrap();
        let result = outcome.aggregate().cloned().unwrap();
        assert_eq!(result.download, 22.0);
        assert_eq!(result.upload, 5.0);
        assert_eq!(result.ping, 30.0);
        assert_eq!(result.jitter, 2.3);
        assert_eq!(result.sample_count, 3);
        assert_eq!(result.confidence, Confidence::Low);

        let events = drain(&mut events);
        let session = session_events(&events);
        assert_eq!(session.len(), 4);

        for (i, event) in session[..3].iter().enumerate() {
            match event {
                SessionEvent::Progress(progress) => {
                    assert_eq!(progress.completed_runs, i + 1);
                    assert_eq!(progress.total_runs, 3);
                }
                other => panic!("expected progress, got {:?}", other),
            }
        }
        assert_eq!(session[3], &SessionEvent::Complete(result));
        assert_eq!(provider.call_count(), 3);

        let downloads: Vec<f64> = outcome.runs().iter().map(|r| r.download).collect();
        assert_eq!(downloads, vec![20.0, 24.0, 22.0]);
    }

    #[tokio::test]
    async fn test_progress_carries_latest_result_and_partial_mean() {
        let provider = Arc::new(ScriptedProvider::new(three_good_runs()));
        let (sequencer, mut events, _) = sequencer_with(provider, fast_config(3));

        sequencer.run_session().await.unwrap();

        let progress: Vec<RunProgress> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Progress(progress) => Some(progress),
                _ => None,
            })
            .collect();

        assert_eq!(progress[0].latest.download, 20.0);
        assert_eq!(progress[0].partial_mean.download, 20.0);
        assert_eq!(progress[1].latest.download, 24.0);
        assert_eq!(progress[1].partial_mean.download, 22.0);
        assert_eq!(progress[1].partial_mean.upload, 5.5);
    }

    #[tokio::test]
    async fn test_attempt_progress_is_forwarded() {
        let provider = Arc::new(ScriptedProvider::new(three_good_runs()));
        let (sequencer, mut events, _) = sequencer_with(provider, fast_config(3));

        sequencer.run_session().await.unwrap();

        let attempt_updates: Vec<AttemptProgress> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::AttemptProgress(progress) => Some(progress),
                _ => None,
            })
            .collect();

        assert_eq!(attempt_updates.len(), 6);
        assert_eq!(attempt_updates[0].run_index, 1);
        assert_eq!(attempt_updates[0].phase, Phase::PingJitter);
        assert_eq!(attempt_updates[5].run_index, 3);
        assert_eq!(attempt_updates[5].phase, Phase::Upload);
    }

    #[tokio::test]
    async fn test_failure_fails_session_without_complete() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Succeed(run(20.0, 5.0, 30.0, 2.0)),
            Step::Fail("connection reset"),
            Step::Succeed(run(22.0, 4.0, 32.0, 2.0)),
        ]));
        let (sequencer, mut events, _) = sequencer_with(provider.clone(), fast_config(3));

        let outcome = sequencer.run_session().await.unwrap();
        match &outcome {
            SessionOutcome::Failed { reason } => assert!(reason.contains("connection reset")),
            other => panic!("expected failure, got {:?}", other),
        }

        let events = drain(&mut events);
        let session = session_events(&events);
        assert_eq!(session.len(), 2);
        assert!(matches!(session[0], SessionEvent::Progress(_)));
        assert!(matches!(session[1], SessionEvent::Failed { .. }));
        assert!(!events.iter().any(|event| matches!(event, SessionEvent::Complete(_))));

        // No further attempts after the failure
        assert_eq!(provider.call_count(), 2);

        let status = sequencer.status();
        assert_eq!(status.status, SessionStatus::Failed);
        assert_eq!(status.completed_runs, 1);
    }

    #[tokio::test]
    async fn test_first_attempt_failure_emits_no_progress() {
        let provider = Arc::new(ScriptedProvider::new(vec![Step::Fail("dns failure")]));
        let (sequencer, mut events, _) = sequencer_with(provider, fast_config(3));

        let outcome = sequencer.run_session().await.unwrap();
        assert!(!outcome.is_completed());

        let events = drain(&mut events);
        let session = session_events(&events);
        assert_eq!(session.len(), 1);
        assert!(matches!(session[0], SessionEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_single_run_session() {
        let provider = Arc::new(ScriptedProvider::new(vec![Step::Succeed(run(55.5, 12.3, 18.0, 4.4))]));
        let (sequencer, mut events, _) = sequencer_with(provider, fast_config(1));

        let outcome = sequencer.run_session().await.unwrap();
        let result = outcome.aggregate().unwrap();
        assert_eq!(result.sample_count, 1);
        assert_eq!(result.download, 55.5);

        let session_count = session_events(&drain(&mut events)).len();
        assert_eq!(session_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_sequential_with_cooldown_between() {
        let provider = Arc::new(ScriptedProvider::with_delay(three_good_runs(), Duration::from_millis(200)));
        let config = SequencerConfig {
            total_runs: 3,
            cooldown: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(5),
        };
        let (sequencer, _events, _) = sequencer_with(provider.clone(), config);

        let start = tokio::time::Instant::now();
        let outcome = sequencer.run_session().await.unwrap();
        assert!(outcome.is_completed());
        assert!(!provider.overlapped.load(Ordering::SeqCst));

        let calls = provider.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            // previous attempt (200ms) + cooldown (500ms)
            assert!(pair[1] - pair[0] >= Duration::from_millis(700));
        }

        // No cooldown after the last attempt
        assert!(start.elapsed() < Duration::from_millis(3 * 200 + 2 * 500 + 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_fails_session() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Succeed(run(20.0, 5.0, 30.0, 2.0)),
            Step::Hang,
        ]));
        let config = SequencerConfig {
            total_runs: 3,
            cooldown: Duration::ZERO,
            attempt_timeout: Duration::from_secs(2),
        };
        let (sequencer, mut events, _) = sequencer_with(provider, config);

        let outcome = sequencer.run_session().await.unwrap();
        match outcome {
            SessionOutcome::Failed { reason } => assert!(reason.contains("Timeout")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
        assert!(!drain(&mut events).iter().any(|e| matches!(e, SessionEvent::Complete(_))));
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_ignored() {
        let provider = Arc::new(ScriptedProvider::with_delay(three_good_runs(), Duration::from_millis(50)));
        let (sequencer, mut events, _) = sequencer_with(provider.clone(), fast_config(3));
        let sequencer = Arc::new(sequencer);

        let running = tokio::spawn({
            let sequencer = sequencer.clone();
            async move { sequencer.run_session().await }
        });

        let mut status = sequencer.subscribe();
        status.wait_for(|snapshot| snapshot.status == SessionStatus::Running).await.unwrap();

        assert_eq!(sequencer.run_session().await.unwrap(), SessionOutcome::Ignored);

        let outcome = running.await.unwrap().unwrap();
        assert!(outcome.is_completed());
        assert_eq!(provider.call_count(), 3);

        let completes = drain(&mut events)
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::Complete(_)))
            .count();
        assert_eq!(completes, 1);
    }

    #[tokio::test]
    async fn test_new_session_can_start_after_previous_finished() {
        let mut steps = three_good_runs();
        steps.extend(three_good_runs());
        let provider = Arc::new(ScriptedProvider::new(steps));
        let (sequencer, _events, _) = sequencer_with(provider.clone(), fast_config(3));

        let first = sequencer.status();
        assert_eq!(first.status, SessionStatus::Idle);

        assert!(sequencer.run_session().await.unwrap().is_completed());
        let first_id = sequencer.status().id;
        assert!(sequencer.run_session().await.unwrap().is_completed());

        assert_ne!(sequencer.status().id, first_id);
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Succeed(run(20.0, 5.0, 30.0, 2.0)),
            Step::Hang,
        ]));
        let (sequencer, mut events, _) = sequencer_with(provider.clone(), fast_config(3));
        let sequencer = Arc::new(sequencer);

        assert!(!sequencer.cancel());

        let running = tokio::spawn({
            let sequencer = sequencer.clone();
            async move { sequencer.run_session().await }
        });

        while provider.call_count() < 2 {
            tokio::task::yield_now().await;
        }
        assert!(sequencer.cancel());

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Failed { reason: CANCELLED_REASON.to_string() });
        assert_eq!(sequencer.status().failure_reason.as_deref(), Some(CANCELLED_REASON));
        assert_eq!(provider.call_count(), 2);
        assert!(!sequencer.is_running());

        let last = drain(&mut events).pop().unwrap();
        assert_eq!(last, SessionEvent::Failed { reason: CANCELLED_REASON.to_string() });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_accepted_right_after_start_is_honoured() {
        for _ in 0..20 {
            let provider = Arc::new(ScriptedProvider::with_delay(three_good_runs(), Duration::from_millis(20)));
            let (sequencer, _events, _) = sequencer_with(provider, fast_config(3));
            let sequencer = Arc::new(sequencer);

            let running = tokio::spawn({
                let sequencer = sequencer.clone();
                async move { sequencer.run_session().await }
            });

            // Fire as early as the sequencer accepts it
            while !sequencer.cancel() {
                tokio::task::yield_now().await;
            }

            let outcome = running.await.unwrap().unwrap();
            assert_eq!(outcome, SessionOutcome::Failed { reason: CANCELLED_REASON.to_string() });
            assert!(!sequencer.is_running());
        }
    }

    #[tokio::test]
    async fn test_cancel_while_idle_does_not_leak_into_next_session() {
        let provider = Arc::new(ScriptedProvider::new(three_good_runs()));
        let (sequencer, _events, _) = sequencer_with(provider, fast_config(3));

        assert!(!sequencer.cancel());
        let outcome = sequencer.run_session().await.unwrap();
        assert!(outcome.is_completed());
        assert_eq!(outcome.runs().len(), 3);
        assert!(!sequencer.cancel());
    }

    #[tokio::test]
    async fn test_session_is_logged_as_one_operation() {
        let provider = Arc::new(ScriptedProvider::new(three_good_runs()));
        let (sequencer, _events, logger) = sequencer_with(provider, fast_config(3));

        sequencer.run_session().await.unwrap();

        let entries = logger.captured();
        let operations: Vec<_> = entries
            .iter()
            .filter(|entry| entry.fields.get("operation") == Some(&serde_json::json!("speed_test_session")))
            .collect();
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0].correlation_id, operations[1].correlation_id);

        let attempts = entries.iter().filter(|entry| entry.message == "Attempt completed").count();
        assert_eq!(attempts, 3);
        assert!(entries
            .iter()
            .filter(|entry| entry.message == "Attempt completed")
            .all(|entry| entry.fields.contains_key("session_id")));
    }

    #[test]
    fn test_sequencer_config_from_config() {
        let config = Config {
            total_runs: 5,
            cooldown_ms: 250,
            attempt_timeout_secs: 30,
            ..Config::default()
        };
        let sequencer_config = SequencerConfig::from(&config);
        assert_eq!(sequencer_config.total_runs, 5);
        assert_eq!(sequencer_config.cooldown, Duration::from_millis(250));
        assert_eq!(sequencer_config.attempt_timeout, Duration::from_secs(30));
    }
}
