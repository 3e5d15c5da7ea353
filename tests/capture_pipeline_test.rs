//! Integration tests for the capture pipeline
//!
//! Input events -> TelemetryRecorder -> sample rings -> snapshot payload

use liveness_collector::capture::{InputEvent, PointerEvent, TelemetryRecorder, MOUSE_CAPACITY};
use liveness_collector::session::{ScreenInfo, SessionContext, SimulatedFlags};
use liveness_collector::simulate::{InputSynthesizer, MotionProfile};
use liveness_collector::submit::{
    BehaviorSnapshotPayload, BehaviorSummary, Journey, SNAPSHOT_MOUSE_SAMPLES,
};
use proptest::prelude::*;

fn moves(n: usize) -> Vec<InputEvent> {
    (0..n)
        .map(|i| InputEvent::Pointer(PointerEvent::moved(i as f64, (i * 2) as f64, i as f64 * 10.0)))
        .collect()
}

#[test]
fn test_synthetic_form_fill_is_recorded() {
    let mut recorder = TelemetryRecorder::new();
    let mut synth = InputSynthesizer::seeded(MotionProfile::Human, 11);
    for event in synth.form_fill("250.00", "Jane Roe", 0.0) {
        recorder.observe(&event);
    }

    assert!(recorder.mouse_len() > 0);
    // "250.00" + "Jane Roe"
    assert_eq!(recorder.keys_len(), 14);
    assert_eq!(recorder.paste_count(), 0);
}

#[test]
fn test_bot_form_fill_pastes_beneficiary() {
    let mut recorder = TelemetryRecorder::new();
    let mut synth = InputSynthesizer::seeded(MotionProfile::Bot, 11);
    for event in synth.form_fill("9999", "Mallory", 0.0) {
        recorder.observe(&event);
    }

    assert_eq!(recorder.keys_len(), 4);
    assert_eq!(recorder.paste_count(), 1);
}

#[test]
fn test_snapshot_payload_from_recorder() {
    let mut recorder = TelemetryRecorder::new();
    for event in moves(1000) {
        recorder.observe(&event);
    }
    recorder.observe(&InputEvent::Paste);

    let session = SessionContext::with_session_id("sess-1", ScreenInfo::default());
    let flags = SimulatedFlags {
        headless: true,
        ..Default::default()
    };
    let behavior = BehaviorSummary::from_recorder(&recorder, SNAPSHOT_MOUSE_SAMPLES, 400);
    let payload = BehaviorSnapshotPayload::build(&session, flags, "web", behavior, Journey::new("10", "Bob"));

    assert_eq!(payload.behavior.mouse.len(), SNAPSHOT_MOUSE_SAMPLES);
    // Newest 800 of 1000, oldest first
    assert_eq!(payload.behavior.mouse[0].x, 200.0);
    assert_eq!(payload.behavior.mouse[SNAPSHOT_MOUSE_SAMPLES - 1].x, 999.0);
    assert_eq!(payload.behavior.paste_count, 1);

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["session_id"], "sess-1");
    assert_eq!(json["env"]["flags"]["headless"], true);
    assert_eq!(json["journey"]["new_beneficiary"], true);
}

#[test]
fn test_snapshot_does_not_drain() {
    let mut recorder = TelemetryRecorder::new();
    for event in moves(50) {
        recorder.observe(&event);
    }
    let first = recorder.snapshot_mouse(10);
    let second = recorder.snapshot_mouse(10);
    assert_eq!(first, second);
    assert_eq!(recorder.mouse_len(), 50);
}

#[test]
fn test_down_and_up_are_not_passive_samples() {
    let mut recorder = TelemetryRecorder::new();
    recorder.observe(&InputEvent::Pointer(PointerEvent::down(1.0, 1.0, 0.0)));
    recorder.observe(&InputEvent::Pointer(PointerEvent::up(1.0, 1.0, 5.0)));
    assert_eq!(recorder.mouse_len(), 0);
}

proptest! {
    #[test]
    fn prop_pointer_buffer_holds_newest(n in 0usize..3000) {
        let mut recorder = TelemetryRecorder::new();
        for i in 0..n {
            recorder.record_pointer_move(i as f64, 0.0, i as f64);
        }
        prop_assert_eq!(recorder.mouse_len(), n.min(MOUSE_CAPACITY));

        let all = recorder.snapshot_mouse(MOUSE_CAPACITY);
        if let Some(last) = all.last() {
            prop_assert_eq!(last.x, (n - 1) as f64);
        }
        if let Some(first) = all.first() {
            prop_assert_eq!(first.x, n.saturating_sub(MOUSE_CAPACITY) as f64);
        }
    }

    #[test]
    fn prop_dt_is_gap_to_previous_move(times in proptest::collection::vec(0.0f64..1e6, 1..200)) {
        let mut sorted = times.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut recorder = TelemetryRecorder::new();
        for t in &sorted {
            recorder.record_pointer_move(0.0, 0.0, *t);
        }
        let samples = recorder.snapshot_mouse(sorted.len());
        prop_assert_eq!(samples[0].dt, 0.0);
        for pair in samples.windows(2) {
            prop_assert!((pair[1].dt - (pair[1].t - pair[0].t)).abs() < 1e-9);
            prop_assert!(pair[1].dt >= 0.0);
        }
    }

    #[test]
    fn prop_paste_count_is_monotonic(pastes in 0u64..500, keys in 0usize..50) {
        let mut recorder = TelemetryRecorder::new();
        let mut last = 0;
        for i in 0..pastes {
            recorder.observe(&InputEvent::Paste);
            if (i as usize) < keys {
                recorder.record_key_down("x", i as f64);
            }
            prop_assert!(recorder.paste_count() > last);
            last = recorder.paste_count();
        }
        prop_assert_eq!(recorder.paste_count(), pastes);
    }
}
