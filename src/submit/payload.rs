//! Submission payloads and responses
//!
//! Field names follow the collector's JSON contract, so several Rust names
//! are mapped with `serde(rename)`.

use crate::capture::recorder::TelemetryRecorder;
use crate::capture::types::{KeySample, PointerSample};
use crate::challenge::path::PathSpec;
use crate::challenge::state::TrailPoint;
use crate::session::context::{EnvSnapshot, SessionContext};
use crate::session::flags::SimulatedFlags;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Pointer samples included in a behavior snapshot
pub const SNAPSHOT_MOUSE_SAMPLES: usize = 800;
/// Key samples included in a behavior snapshot
pub const SNAPSHOT_KEY_SAMPLES: usize = 400;
/// Channel tag for browser-originated submissions
pub const DEFAULT_CHANNEL: &str = "web";

/// Current UTC time as an RFC 3339 string with millisecond precision
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Environment descriptor plus the flags sampled for this submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvWithFlags {
    #[serde(flatten)]
    pub env: EnvSnapshot,
    pub flags: SimulatedFlags,
}

/// Passive behavior captured so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSummary {
    pub mouse: Vec<PointerSample>,
    pub keys: Vec<KeySample>,
    pub paste_count: u64,
}

impl BehaviorSummary {
    /// Take the most recent samples from the recorder without mutating it
    pub fn from_recorder(recorder: &TelemetryRecorder, mouse: usize, keys: usize) -> Self {
        Self {
            mouse: recorder.snapshot_mouse(mouse),
            keys: recorder.snapshot_keys(keys),
            paste_count: recorder.paste_count(),
        }
    }
}

/// What the user is trying to do (the protected form's fields)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub amount: String,
    pub beneficiary: String,
    pub new_beneficiary: bool,
}

impl Journey {
    pub fn new(amount: impl Into<String>, beneficiary: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            beneficiary: beneficiary.into(),
            new_beneficiary: true,
        }
    }
}

/// Body of `POST /collect`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSnapshotPayload {
    pub session_id: String,
    #[serde(rename = "ts")]
    pub timestamp: String,
    pub channel: String,
    pub env: EnvWithFlags,
    pub behavior: BehaviorSummary,
    pub journey: Journey,
}

impl BehaviorSnapshotPayload {
    /// Build a snapshot at the current time. `flags` must be freshly sampled.
    pub fn build(
        session: &SessionContext,
        flags: SimulatedFlags,
        channel: &str,
        behavior: BehaviorSummary,
        journey: Journey,
    ) -> Self {
        Self {
            session_id: session.session_id().to_string(),
            timestamp: timestamp_now(),
            channel: channel.to_string(),
            env: EnvWithFlags {
                env: session.env().clone(),
                flags,
            },
            behavior,
            journey,
        }
    }
}

/// Body of `POST /challenge`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResultPayload {
    pub session_id: String,
    #[serde(rename = "ts")]
    pub timestamp: String,
    pub path_spec: PathSpec,
    pub trail: Vec<TrailPoint>,
    pub env_flags: SimulatedFlags,
}

impl ChallengeResultPayload {
    pub fn build(
        session: &SessionContext,
        path: PathSpec,
        trail: Vec<TrailPoint>,
        flags: SimulatedFlags,
    ) -> Self {
        Self {
            session_id: session.session_id().to_string(),
            timestamp: timestamp_now(),
            path_spec: path,
            trail,
            env_flags: flags,
        }
    }
}

/// The risk engine's verdict for a behavior snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Decision {
    pub fn new(action: impl Into<String>, reasons: &[&str]) -> Self {
        Self {
            action: action.into(),
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Response of `POST /collect`; fields besides `decision` are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct CollectResponse {
    #[serde(default)]
    pub decision: Decision,
}

/// Response of `POST /challenge`; fields besides `passed` are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeVerdict {
    pub passed: bool,
}
