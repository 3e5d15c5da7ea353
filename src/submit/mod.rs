//! Submission protocol: payloads and the collector client

pub mod client;
pub mod payload;

pub use client::{
    resolve_base_url, CollectorClient, HttpTransport, Transport, BASE_URL_VAR, CHALLENGE_PATH,
    COLLECT_PATH, DEFAULT_BASE_URL,
};
pub use payload::{
    BehaviorSnapshotPayload, BehaviorSummary, ChallengeResultPayload, ChallengeVerdict,
    CollectResponse, Decision, EnvWithFlags, Journey, DEFAULT_CHANNEL, SNAPSHOT_KEY_SAMPLES,
    SNAPSHOT_MOUSE_SAMPLES,
};
