//! End-to-end tests for the protected form
//!
//! Recorder -> /collect -> decision rendering -> optional drag step-up

use liveness_collector::app::ConsoleView;
use liveness_collector::capture::{PointerEvent, TelemetryRecorder};
use liveness_collector::challenge::{
    ChallengeCommand, ChallengeOutcome, ChallengeParams, CompletionDetector, DragChallenge,
    PathGenerator, PathSpec, Point,
};
use liveness_collector::decision::Dispatch;
use liveness_collector::session::{FixedFlags, ScreenInfo, SessionContext, SimulatedFlags};
use liveness_collector::submit::{CollectorClient, HttpTransport, Journey, Transport};
use liveness_collector::workflow::ProtectedForm;
use liveness_collector::{Error, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

/// Collector answering each POST with the next scripted reply
struct Scripted {
    replies: RefCell<VecDeque<Result<Value>>>,
    posts: RefCell<Vec<(String, Value)>>,
}

impl Scripted {
    fn new(replies: Vec<Result<Value>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            posts: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for Scripted {
    async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
        self.posts.borrow_mut().push((url.to_string(), body));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("no reply scripted".to_string())))
    }
}

fn filled_recorder() -> TelemetryRecorder {
    let mut recorder = TelemetryRecorder::new();
    for i in 0..30 {
        recorder.record_pointer_move(10.0 + i as f64, 20.0, i as f64 * 16.0);
    }
    for (i, key) in ["1", "2", "0"].iter().enumerate() {
        recorder.record_key_down(*key, 600.0 + i as f64 * 150.0);
    }
    recorder
}

fn console_text(view: ConsoleView<Vec<u8>>) -> String {
    String::from_utf8(view.into_inner()).unwrap()
}

#[tokio::test]
async fn test_allow_renders_line_and_resets_form() {
    let collector = Scripted::new(vec![Ok(json!({
        "decision": { "action": "allow", "reasons": ["low_risk"] }
    }))]);
    let client = CollectorClient::new(&collector, "http://collector.test");
    let session = SessionContext::with_session_id("sess-allow", ScreenInfo::default());
    let flags = FixedFlags::default();
    let form = ProtectedForm::new(&client, &session, &flags);

    let mut view = ConsoleView::with_writer(Vec::new());
    let dispatch = form
        .submit(&filled_recorder(), Journey::new("120", "ACME"), &mut view)
        .await
        .unwrap();

    assert_eq!(dispatch, Dispatch::Terminal("allow".to_string()));
    assert_eq!(view.form_resets(), 1);
    let text = console_text(view);
    assert!(text.contains("Action: allow | Reasons: low_risk"));
    assert!(text.contains("Form reset."));

    let posts = collector.posts.borrow();
    assert_eq!(posts.len(), 1);
    let (url, body) = &posts[0];
    assert_eq!(url, "http://collector.test/collect");
    assert_eq!(body["session_id"], "sess-allow");
    assert_eq!(body["channel"], "web");
    assert_eq!(body["behavior"]["mouse"].as_array().map(Vec::len), Some(30));
    assert_eq!(body["behavior"]["keys"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["behavior"]["paste_count"], 0);
    assert_eq!(body["journey"]["amount"], "120");
    assert!(body["ts"].as_str().is_some_and(|ts| ts.ends_with('Z')));
}

#[tokio::test]
async fn test_missing_decision_renders_empty_action() {
    let collector = Scripted::new(vec![Ok(json!({}))]);
    let client = CollectorClient::new(&collector, "http://collector.test");
    let session = SessionContext::with_session_id("sess-empty", ScreenInfo::default());
    let flags = FixedFlags::default();
    let form = ProtectedForm::new(&client, &session, &flags);

    let mut view = ConsoleView::with_writer(Vec::new());
    let dispatch = form
        .submit(&TelemetryRecorder::new(), Journey::new("1", "x"), &mut view)
        .await
        .unwrap();

    assert_eq!(dispatch, Dispatch::Terminal(String::new()));
    assert!(console_text(view).contains("Action:  | Reasons: "));
}

#[tokio::test]
async fn test_network_failure_keeps_form_for_resubmit() {
    let collector = Scripted::new(vec![
        Err(Error::Network("HTTP 502".to_string())),
        Ok(json!({ "decision": { "action": "allow", "reasons": [] } })),
    ]);
    let client = CollectorClient::new(&collector, "http://collector.test");
    let session = SessionContext::with_session_id("sess-retry", ScreenInfo::default());
    let flags = FixedFlags::default();
    let form = ProtectedForm::new(&client, &session, &flags);
    let recorder = filled_recorder();

    let mut view = ConsoleView::with_writer(Vec::new());
    let first = form.submit(&recorder, Journey::new("5", "Eve"), &mut view).await;
    assert!(matches!(first, Err(Error::Network(_))));
    assert_eq!(view.form_resets(), 0);

    let second = form.submit(&recorder, Journey::new("5", "Eve"), &mut view).await.unwrap();
    assert_eq!(second, Dispatch::Terminal("allow".to_string()));
    assert_eq!(view.form_resets(), 1);

    let text = console_text(view);
    assert!(text.contains("Error: HTTP 502"));
    // Same samples went out both times
    let posts = collector.posts.borrow();
    assert_eq!(posts[0].1["behavior"], posts[1].1["behavior"]);
}

#[tokio::test]
async fn test_unreachable_collector_is_a_network_error() {
    let transport = HttpTransport::new(Duration::from_millis(500)).unwrap();
    let client = CollectorClient::new(transport, "http://127.0.0.1:1");
    let session = SessionContext::with_session_id("sess-down", ScreenInfo::default());
    let flags = FixedFlags::default();
    let form = ProtectedForm::new(&client, &session, &flags);

    let mut view = ConsoleView::with_writer(Vec::new());
    let result = form.submit(&TelemetryRecorder::new(), Journey::new("1", "x"), &mut view).await;
    assert!(matches!(result, Err(Error::Network(_))));
    assert_eq!(view.form_resets(), 0);
    assert!(console_text(view).starts_with("Error: "));
}

#[tokio::test(start_paused = true)]
async fn test_behavior_step_up_runs_challenge() {
    let collector = Scripted::new(vec![
        Ok(json!({
            "decision": {
                "action": "step_up_behavior_challenge",
                "reasons": ["paste_in_beneficiary", "proxy"]
            }
        })),
        Ok(json!({ "passed": false })),
    ]);
    let client = CollectorClient::new(&collector, "http://collector.test");
    let session = SessionContext::with_session_id("sess-step", ScreenInfo::default());
    let flags = FixedFlags(SimulatedFlags {
        proxy_or_vpn_or_tor: true,
        ..Default::default()
    });
    let form = ProtectedForm::new(&client, &session, &flags);

    let mut view = ConsoleView::with_writer(Vec::new());
    let dispatch = form
        .submit(&filled_recorder(), Journey::new("900", "Mallory"), &mut view)
        .await
        .unwrap();
    assert_eq!(dispatch, Dispatch::OpenChallenge);
    assert_eq!(view.form_resets(), 0);

    let path = PathSpec {
        start: Point::new(40.0, 60.0),
        end: Point::new(760.0, 420.0),
        control1: Point::new(200.0, 400.0),
        control2: Point::new(600.0, 80.0),
    };
    let mut challenge = DragChallenge::with_generator(PathGenerator::seeded(3), ChallengeParams::default());
    challenge.open_with(path);

    let (tx, rx) = mpsc::channel(64);
    tx.send(ChallengeCommand::Pointer(PointerEvent::down(40.0, 60.0, 0.0))).await.unwrap();
    for i in 1..=24 {
        let f = i as f64 / 24.0;
        let x = 40.0 + 718.0 * f;
        let y = 60.0 + 359.0 * f;
        tx.send(ChallengeCommand::Pointer(PointerEvent::moved(x, y, i as f64 * 16.0)))
            .await
            .unwrap();
    }

    let outcome = form
        .step_up(challenge, CompletionDetector::default(), rx, Duration::from_millis(10), &mut view)
        .await
        .unwrap();
    assert_eq!(outcome, ChallengeOutcome::Completed { passed: false, trail_len: 24 });
    assert!(!view.challenge_visible());

    let text = console_text(view);
    assert!(text.contains("Action: step_up_behavior_challenge | Reasons: paste_in_beneficiary, proxy"));
    assert!(text.contains("Failed ❌"));
    assert!(text.contains("Action: deny (post-challenge)"));

    let posts = collector.posts.borrow();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].0, "http://collector.test/challenge");
    assert_eq!(posts[1].1["env_flags"]["proxy_vpn_tor"], true);
    drop(tx);
}
