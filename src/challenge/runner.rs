//! Challenge Runner
//!
//! Drives one drag challenge on a single task: pointer commands, detector
//! ticks and the in-flight `/challenge` call are multiplexed with
//! `tokio::select!`, so every handler runs to completion before the next
//! one and the detector always sees a whole trail.
//!
//! ```text
//!   commands ──▶ DragChallenge ──▶ trail
//!                                    │
//!   interval ──▶ CompletionDetector ─┘ near end? ──▶ POST /challenge ──▶ verdict
//! ```

use super::detector::CompletionDetector;
use super::state::{ChallengeAttempt, DragChallenge, PointerInput, MSG_CHECKING, MSG_FAILED, MSG_PASSED};
use crate::capture::types::PointerEvent;
use crate::session::context::SessionContext;
use crate::session::flags::FlagSource;
use crate::submit::client::{CollectorClient, Transport};
use crate::submit::payload::{ChallengeResultPayload, ChallengeVerdict};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay between showing the verdict and hiding the challenge
pub const DEFAULT_DISMISS_DELAY: Duration = Duration::from_secs(1);

/// Input delivered to a running challenge
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeCommand {
    Pointer(PointerEvent),
    Restart,
    Cancel,
}

/// How a challenge run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The collector acknowledged the trail
    Completed { passed: bool, trail_len: usize },
    /// The user closed the challenge, nothing was submitted
    Cancelled,
}

/// Where the challenge is displayed
pub trait ChallengeView {
    fn show_status(&mut self, status: &str);
    fn redraw(&mut self, attempt: &ChallengeAttempt);
    fn hide(&mut self);
}

type PendingVerdict<'a> = Pin<Box<dyn Future<Output = Result<ChallengeVerdict>> + 'a>>;

/// Runs a [`DragChallenge`] to a verdict or a cancellation
pub struct ChallengeRunner<'a, T, F, R = StdRng> {
    challenge: DragChallenge<R>,
    detector: CompletionDetector,
    client: &'a CollectorClient<T>,
    session: &'a SessionContext,
    flags: &'a F,
    dismiss_delay: Duration,
    last_status: String,
}

impl<'a, T, F, R> ChallengeRunner<'a, T, F, R>
where
    T: Transport + 'a,
    F: FlagSource,
    R: Rng,
{
    pub fn new(
        challenge: DragChallenge<R>,
        detector: CompletionDetector,
        client: &'a CollectorClient<T>,
        session: &'a SessionContext,
        flags: &'a F,
    ) -> Self {
        Self {
            challenge,
            detector,
            client,
            session,
            flags,
            dismiss_delay: DEFAULT_DISMISS_DELAY,
            last_status: String::new(),
        }
    }

    pub fn with_dismiss_delay(mut self, delay: Duration) -> Self {
        self.dismiss_delay = delay;
        self
    }

    pub fn challenge(&self) -> &DragChallenge<R> {
        &self.challenge
    }

    /// Run until the collector returns a verdict or the user cancels.
    ///
    /// Opens a new attempt unless one is already armed. A failed
    /// `/challenge` call leaves the attempt as it was and stops detection
    /// until the next restart.
    ///
    /// Closing the command channel freezes the trail: a submission already
    /// in flight still resolves, a finished trail is submitted at once, and
    /// anything else ends the run. A closed channel with a failed
    /// submission behind it returns that error, otherwise the run counts as
    /// cancelled.
    pub async fn run<V: ChallengeView>(
        mut self,
        mut commands: mpsc::Receiver<ChallengeCommand>,
        view: &mut V,
    ) -> Result<ChallengeOutcome> {
        if self.challenge.attempt().map_or(true, |a| !a.state().is_live()) {
            self.challenge.open()?;
        }
        self.refresh(view);

        let mut ticker = time::interval(self.detector.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut detecting = true;
        let mut input_open = true;
        let mut pending: Option<PendingVerdict<'a>> = None;
        let mut last_error: Option<Error> = None;

        loop {
            tokio::select! {
                command = commands.recv(), if input_open => match command {
                    Some(ChallengeCommand::Pointer(event)) => {
                        self.challenge.handle_pointer(&event);
                        self.refresh(view);
                    }
                    Some(ChallengeCommand::Restart) => {
                        pending = None;
                        last_error = None;
                        self.challenge.restart()?;
                        detecting = true;
                        ticker.reset();
                        self.refresh(view);
                    }
                    Some(ChallengeCommand::Cancel) => return Ok(self.cancel(view)),
                    None => {
                        input_open = false;
                        if pending.is_none() {
                            if detecting {
                                pending = self.begin_submission(view);
                            }
                            if pending.is_none() {
                                debug!("Command channel closed before completion");
                                let outcome = self.cancel(view);
                                return match last_error {
                                    Some(e) => Err(e),
                                    None => Ok(outcome),
                                };
                            }
                            detecting = false;
                        }
                    }
                },
                _ = ticker.tick(), if detecting => {
                    if let Some(submission) = self.begin_submission(view) {
                        detecting = false;
                        pending = Some(submission);
                    }
                }
                verdict = async {
                    match pending.as_mut() {
                        Some(fut) => fut.await,
                        None => std::future::pending().await,
                    }
                }, if pending.is_some() => {
                    pending = None;
                    match verdict {
                        Ok(verdict) => return Ok(self.finish(verdict, view).await),
                        Err(e) => {
                            warn!("Challenge submission failed: {}", e);
                            let message = match &e {
                                Error::Network(message) => message.clone(),
                                other => other.to_string(),
                            };
                            self.challenge.set_status(format!("Error: {}", message));
                            self.refresh(view);
                            if !input_open {
                                self.cancel(view);
                                return Err(e);
                            }
                            last_error = Some(e);
                        }
                    }
                }
            }
        }
    }

    /// Start the `/challenge` call when the detector accepts the attempt
    fn begin_submission<V: ChallengeView>(&mut self, view: &mut V) -> Option<PendingVerdict<'a>> {
        let attempt = self.challenge.attempt().filter(|a| self.detector.check(a))?;
        let payload = ChallengeResultPayload::build(
            self.session,
            *attempt.path(),
            attempt.trail().to_vec(),
            self.flags.current(),
        );
        info!(trail_len = payload.trail.len(), "Challenge end reached");
        self.challenge.set_status(MSG_CHECKING);
        self.refresh(view);

        let client = self.client;
        Some(Box::pin(async move {
            client.submit_challenge_result(&payload).await
        }))
    }

    fn cancel<V: ChallengeView>(&mut self, view: &mut V) -> ChallengeOutcome {
        self.challenge.cancel();
        view.hide();
        ChallengeOutcome::Cancelled
    }

    async fn finish<V: ChallengeView>(&mut self, verdict: ChallengeVerdict, view: &mut V) -> ChallengeOutcome {
        let trail_len = self.challenge.attempt().map_or(0, |a| a.trail().len());
        self.challenge.complete();
        self.challenge
            .set_status(if verdict.passed { MSG_PASSED } else { MSG_FAILED });
        self.refresh(view);
        info!(passed = verdict.passed, trail_len, "Challenge verdict received");

        time::sleep(self.dismiss_delay).await;
        view.hide();
        ChallengeOutcome::Completed {
            passed: verdict.passed,
            trail_len,
        }
    }

    fn refresh<V: ChallengeView>(&mut self, view: &mut V) {
        if let Some(attempt) = self.challenge.attempt() {
            view.redraw(attempt);
        }
        if self.challenge.status() != self.last_status {
            self.last_status = self.challenge.status().to_string();
            debug!(status = %self.last_status, "Challenge status");
            view.show_status(&self.last_status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::path::{PathGenerator, PathSpec, Point};
    use crate::challenge::state::{ChallengeParams, MSG_OPENED};
    use crate::session::context::ScreenInfo;
    use crate::session::flags::FixedFlags;
    use serde_json::Value;
    use std::cell::{Cell, RefCell};

    struct FakeCollector {
        posts: RefCell<Vec<(String, Value)>>,
        fail_first: Cell<bool>,
        passed: bool,
    }

    impl FakeCollector {
        fn new(passed: bool) -> Self {
            Self {
                posts: RefCell::new(Vec::new()),
                fail_first: Cell::new(false),
                passed,
            }
        }
    }

    impl Transport for FakeCollector {
        async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
            self.posts.borrow_mut().push((url.to_string(), body));
            if self.fail_first.replace(false) {
                return Err(Error::Network("HTTP 503".to_string()));
            }
            Ok(serde_json::json!({ "passed": self.passed }))
        }
    }

    #[derive(Default)]
    struct RecordingView {
        statuses: Vec<String>,
        redraws: usize,
        hidden: bool,
    }

    impl ChallengeView for RecordingView {
        fn show_status(&mut self, status: &str) {
            self.statuses.push(status.to_string());
        }
        fn redraw(&mut self, _attempt: &ChallengeAttempt) {
            self.redraws += 1;
        }
        fn hide(&mut self) {
            self.hidden = true;
        }
    }

    fn path() -> PathSpec {
        PathSpec {
            start: Point::new(40.0, 60.0),
            end: Point::new(760.0, 420.0),
            control1: Point::new(200.0, 400.0),
            control2: Point::new(600.0, 80.0),
        }
    }

    fn armed() -> DragChallenge {
        let mut c = DragChallenge::with_generator(PathGenerator::seeded(5), ChallengeParams::default());
        c.open_with(path());
        c
    }

    /// Down at the start, then `n` moves ending on the goal
    fn drag_to_end(n: usize) -> Vec<ChallengeCommand> {
        let mut commands = vec![ChallengeCommand::Pointer(PointerEvent::down(40.0, 60.0, 0.0))];
        for i in 1..=n {
            let f = i as f64 / n as f64;
            let x = 40.0 + (755.0 - 40.0) * f;
            let y = 60.0 + (418.0 - 60.0) * f;
            commands.push(ChallengeCommand::Pointer(PointerEvent::moved(x, y, i as f64 * 16.0)));
        }
        commands
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_pass() {
        let collector = FakeCollector::new(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags);

        let (tx, rx) = mpsc::channel(64);
        for c in drag_to_end(30) {
            tx.send(c).await.unwrap();
        }
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();

        assert_eq!(outcome, ChallengeOutcome::Completed { passed: true, trail_len: 30 });
        assert!(view.hidden);
        assert!(view.redraws > 30);
        assert_eq!(view.statuses.first().map(String::as_str), Some(MSG_OPENED));
        assert!(view.statuses.iter().any(|s| s == MSG_CHECKING));
        assert_eq!(view.statuses.last().map(String::as_str), Some(MSG_PASSED));

        let posts = collector.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "http://collector.test/challenge");
        assert_eq!(posts[0].1["session_id"], "s1");
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_verdict() {
        let collector = FakeCollector::new(false);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags)
            .with_dismiss_delay(Duration::ZERO);

        let (tx, rx) = mpsc::channel(64);
        for c in drag_to_end(25) {
            tx.send(c).await.unwrap();
        }
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Completed { passed: false, trail_len: 25 });
        assert_eq!(view.statuses.last().map(String::as_str), Some(MSG_FAILED));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_submits_nothing() {
        let collector = FakeCollector::new(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags);

        let (tx, rx) = mpsc::channel(8);
        tx.send(ChallengeCommand::Pointer(PointerEvent::down(40.0, 60.0, 0.0))).await.unwrap();
        tx.send(ChallengeCommand::Cancel).await.unwrap();
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();

        assert_eq!(outcome, ChallengeOutcome::Cancelled);
        assert!(view.hidden);
        assert!(collector.posts.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_keeps_state_until_restart() {
        let collector = FakeCollector::new(true);
        collector.fail_first.set(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags)
            .with_dismiss_delay(Duration::ZERO);

        let (tx, rx) = mpsc::channel(128);
        let mut view = RecordingView::default();

        let driver = async {
            for c in drag_to_end(25) {
                tx.send(c).await.unwrap();
            }
            // Long enough for detection and the failing submission
            time::sleep(Duration::from_secs(2)).await;
            tx.send(ChallengeCommand::Restart).await.unwrap();
            for c in drag_to_end(22) {
                tx.send(c).await.unwrap();
            }
            time::sleep(Duration::from_secs(5)).await;
        };

        let (outcome, _) = tokio::join!(runner.run(rx, &mut view), driver);
        let outcome = outcome.unwrap();

        assert!(view.statuses.iter().any(|s| s == "Error: HTTP 503"));
        assert!(view.statuses.iter().any(|s| s == "Restarted."));
        assert_eq!(outcome, ChallengeOutcome::Completed { passed: true, trail_len: 22 });
        assert_eq!(collector.posts.borrow().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_when_idle() {
        let collector = FakeCollector::new(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let challenge = DragChallenge::with_generator(PathGenerator::seeded(2), ChallengeParams::default());
        let runner = ChallengeRunner::new(challenge, CompletionDetector::default(), &client, &session, &flags);

        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Cancelled);
        assert_eq!(view.statuses, vec![MSG_OPENED.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_still_submits_finished_drag() {
        let collector = FakeCollector::new(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags)
            .with_dismiss_delay(Duration::ZERO);

        let (tx, rx) = mpsc::channel(64);
        for c in drag_to_end(30) {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();

        assert_eq!(outcome, ChallengeOutcome::Completed { passed: true, trail_len: 30 });
        assert_eq!(collector.posts.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_after_failed_submission_returns_error() {
        let collector = FakeCollector::new(true);
        collector.fail_first.set(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags);

        let (tx, rx) = mpsc::channel(64);
        for c in drag_to_end(25) {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        let mut view = RecordingView::default();
        let result = time::timeout(Duration::from_secs(60), runner.run(rx, &mut view))
            .await
            .expect("run must end once input is closed");

        assert!(matches!(result, Err(Error::Network(ref m)) if m == "HTTP 503"));
        assert!(view.statuses.iter().any(|s| s == "Error: HTTP 503"));
        assert!(view.hidden);
        assert_eq!(collector.posts.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_then_closed_input_returns_error() {
        let collector = FakeCollector::new(true);
        collector.fail_first.set(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let runner = ChallengeRunner::new(armed(), CompletionDetector::default(), &client, &session, &flags);

        let (tx, rx) = mpsc::channel(64);
        let mut view = RecordingView::default();
        let driver = async move {
            for c in drag_to_end(25) {
                tx.send(c).await.unwrap();
            }
            // Detection and the failing call happen while the sender is alive
            time::sleep(Duration::from_secs(2)).await;
        };

        let (result, _) = tokio::join!(runner.run(rx, &mut view), driver);
        assert!(matches!(result, Err(Error::Network(_))));
        assert!(view.hidden);
        assert_eq!(collector.posts.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_with_short_trail_cancels() {
        let collector = FakeCollector::new(true);
        let client = CollectorClient::new(&collector, "http://collector.test");
        let session = SessionContext::with_session_id("s1", ScreenInfo::default());
        let flags = FixedFlags::default();
        let detector = CompletionDetector {
            min_trail_points: 60,
            ..CompletionDetector::default()
        };
        let runner = ChallengeRunner::new(armed(), detector, &client, &session, &flags);

        let (tx, rx) = mpsc::channel(64);
        for c in drag_to_end(40) {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        let mut view = RecordingView::default();
        let outcome = runner.run(rx, &mut view).await.unwrap();

        assert_eq!(outcome, ChallengeOutcome::Cancelled);
        assert!(view.hidden);
        assert!(collector.posts.borrow().is_empty());
    }
}
