//! # Liveness Collector
//!
//! Client-side behavioral telemetry and an interactive drag-path liveness
//! challenge feeding a remote risk decision engine.
//!
//! ## Overview
//!
//! Pointer motion, keystroke timing and paste events are recorded passively
//! into bounded buffers. When the user submits a protected form, a snapshot
//! of that behavior goes to the collector's `/collect` endpoint. If the
//! returned decision asks for a behavioral step-up, the user drags a marker
//! along a randomized cubic curve; the trail is sent to `/challenge` once
//! the marker reaches the end.
//!
//! ## Quick Start
//!
//! ```no_run
//! use liveness_collector::capture::TelemetryRecorder;
//! use liveness_collector::session::{EnvFlagSource, ScreenInfo, SessionContext};
//! use liveness_collector::submit::{CollectorClient, HttpTransport, Journey};
//! use liveness_collector::workflow::ProtectedForm;
//! use liveness_collector::app::ConsoleView;
//! use std::time::Duration;
//!
//! # async fn demo() -> liveness_collector::Result<()> {
//! let session = SessionContext::new(ScreenInfo::default());
//! let client = CollectorClient::new(HttpTransport::new(Duration::from_secs(10))?, "http://localhost:8080");
//! let flags = EnvFlagSource;
//!
//! let mut recorder = TelemetryRecorder::new();
//! recorder.record_pointer_move(10.0, 20.0, 0.0);
//! recorder.record_key_down("4", 15.0);
//!
//! let form = ProtectedForm::new(&client, &session, &flags);
//! let mut view = ConsoleView::new();
//! let dispatch = form.submit(&recorder, Journey::new("42.00", "ACME Ltd"), &mut view).await?;
//! println!("{:?}", dispatch);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: session-relative monotonic clock
//! - [`session`]: session id, environment snapshot and simulated risk flags
//! - [`capture`]: input events, FIFO sample rings and the passive recorder
//! - [`challenge`]: path generation, guide rendering, the drag state machine,
//!   the completion detector and the async challenge runner
//! - [`submit`]: wire payloads and the collector client
//! - [`decision`]: decision rendering and dispatch
//! - [`stream`]: live event log and WebSocket follower
//! - [`simulate`]: synthetic human-like and bot-like input
//! - [`workflow`]: the protected-form flow
//! - [`app`]: CLI, configuration and terminal views
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Input events│───▶│ Sample rings│───▶│  Snapshot   │───▶│  /collect   │
//! │  (capture)  │    │   (FIFO)    │    │  (submit)   │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Verdict   │◀───│ /challenge  │◀───│    Drag     │◀───│  Decision   │
//! │             │    │             │    │  challenge  │    │  renderer   │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod time;
pub mod session;
pub mod capture;
pub mod challenge;
pub mod submit;
pub mod decision;
pub mod stream;
pub mod simulate;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use capture::{InputEvent, PointerEvent, SampleRing, TelemetryRecorder, TelemetryState};
pub use challenge::{ChallengeRunner, CompletionDetector, DragChallenge, PathGenerator, PathSpec};
pub use session::{SessionContext, SimulatedFlags};
pub use submit::{CollectorClient, Decision, HttpTransport, Transport};
pub use time::MonotonicClock;
pub use workflow::ProtectedForm;

/// Result type alias for the liveness collector
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the liveness collector
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream init error: {0}")]
    StreamInit(String),

    #[error("Stream message parse error: {0}")]
    StreamMessageParse(String),

    #[error("Challenge error: {0}")]
    Challenge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
