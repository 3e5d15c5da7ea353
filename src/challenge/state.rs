//! Drag Challenge State Machine
//!
//! One attempt at a time: the user grabs the marker at the path start and
//! drags it toward the end. The machine is driven by abstract pointer
//! events so it runs headless under test.
//!
//! ```text
//!            open()                 down near marker
//!   Idle ─────────────▶ Armed ───────────────────────▶ Dragging
//!                         ▲  ◀────────────────────────    │
//!                         │           up                  │ move: append trail
//!             restart()   │                               ▼
//!   (any) ────────────────┘      cancel(): (any) ──▶ Cancelled
//!                                complete(): ──────▶ Completed
//! ```
//!
//! Dragging is re-armable: releasing the button returns to `Armed` with the
//! marker left where it was, and the next grab keeps appending to the same
//! trail.

use super::path::{PathGenerator, PathSpec, Point, Polyline, DEFAULT_POLYLINE_STEPS};
use crate::capture::types::{PointerEvent, PointerKind};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Radius around the marker that counts as grabbing it
pub const DEFAULT_CAPTURE_RADIUS: f64 = 15.0;

pub const MSG_OPENED: &str = "Drag the dot along the path.";
pub const MSG_DRAGGING: &str = "Keep the dot on the path…";
pub const MSG_RESTARTED: &str = "Restarted.";
pub const MSG_CHECKING: &str = "Checking…";
pub const MSG_PASSED: &str = "Passed ✅";
pub const MSG_FAILED: &str = "Failed ❌";

/// Lifecycle of the challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    /// No attempt open
    Idle,
    /// Path shown, waiting for the marker to be grabbed
    Armed,
    /// Marker held and following the pointer
    Dragging,
    /// Result submitted and acknowledged
    Completed,
    /// Aborted by the user
    Cancelled,
}

impl ChallengeState {
    /// States in which pointer input still affects the attempt
    pub fn is_live(&self) -> bool {
        matches!(self, ChallengeState::Armed | ChallengeState::Dragging)
    }
}

/// One captured position of the marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl TrailPoint {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Abstract pointer input, decoupled from any UI toolkit
pub trait PointerInput {
    fn on_pointer_down(&mut self, at: Point, t: f64);
    fn on_pointer_move(&mut self, at: Point, t: f64);
    fn on_pointer_up(&mut self, at: Point, t: f64);

    /// Dispatch a stamped pointer event to the matching handler
    fn handle_pointer(&mut self, event: &PointerEvent) {
        let at = Point::new(event.x, event.y);
        match event.kind {
            PointerKind::Down => self.on_pointer_down(at, event.t),
            PointerKind::Move => self.on_pointer_move(at, event.t),
            PointerKind::Up => self.on_pointer_up(at, event.t),
        }
    }
}

/// A single challenge attempt
#[derive(Debug, Clone)]
pub struct ChallengeAttempt {
    path: PathSpec,
    polyline: Polyline,
    trail: Vec<TrailPoint>,
    state: ChallengeState,
    started_at: Option<f64>,
    marker: Point,
}

impl ChallengeAttempt {
    fn new(path: PathSpec, polyline_steps: usize) -> Self {
        Self {
            polyline: path.sample_polyline(polyline_steps),
            trail: Vec::new(),
            state: ChallengeState::Armed,
            started_at: None,
            marker: path.start,
            path,
        }
    }

    pub fn path(&self) -> &PathSpec {
        &self.path
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    pub fn trail(&self) -> &[TrailPoint] {
        &self.trail
    }

    pub fn state(&self) -> ChallengeState {
        self.state
    }

    /// Time of the first captured trail point
    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn marker(&self) -> Point {
        self.marker
    }

    /// Started and not yet completed or cancelled
    pub fn in_progress(&self) -> bool {
        self.started_at.is_some() && self.state.is_live()
    }
}

/// Geometry knobs for the challenge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChallengeParams {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub capture_radius: f64,
    pub polyline_steps: usize,
}

impl Default for ChallengeParams {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 480.0,
            capture_radius: DEFAULT_CAPTURE_RADIUS,
            polyline_steps: DEFAULT_POLYLINE_STEPS,
        }
    }
}

/// Drag challenge state machine
#[derive(Debug)]
pub struct DragChallenge<R = StdRng> {
    generator: PathGenerator<R>,
    params: ChallengeParams,
    attempt: Option<ChallengeAttempt>,
    status: String,
}

impl DragChallenge<StdRng> {
    /// Challenge with a randomly seeded path generator
    pub fn new(params: ChallengeParams) -> Self {
        Self::with_generator(PathGenerator::new(), params)
    }
}

impl<R: Rng> DragChallenge<R> {
    pub fn with_generator(generator: PathGenerator<R>, params: ChallengeParams) -> Self {
        Self {
            generator,
            params,
            attempt: None,
            status: String::new(),
        }
    }

    pub fn params(&self) -> &ChallengeParams {
        &self.params
    }

    /// Open a fresh attempt on a newly generated path.
    pub fn open(&mut self) -> crate::Result<&ChallengeAttempt> {
        let path = self
            .generator
            .generate(self.params.canvas_width, self.params.canvas_height)?;
        Ok(self.open_with(path))
    }

    /// Open a fresh attempt on a given path, replacing any previous attempt.
    pub fn open_with(&mut self, path: PathSpec) -> &ChallengeAttempt {
        info!(
            start_x = path.start.x,
            start_y = path.start.y,
            end_x = path.end.x,
            end_y = path.end.y,
            "Challenge opened"
        );
        self.status = MSG_OPENED.to_string();
        self.attempt.insert(ChallengeAttempt::new(path, self.params.polyline_steps))
    }

    /// Discard the trail and timer, keep the path, put the marker back at the start.
    pub fn restart(&mut self) -> crate::Result<()> {
        let attempt = self
            .attempt
            .as_mut()
            .ok_or_else(|| crate::Error::Challenge("no challenge to restart".to_string()))?;
        attempt.trail.clear();
        attempt.started_at = None;
        attempt.marker = attempt.path.start;
        attempt.state = ChallengeState::Armed;
        self.status = MSG_RESTARTED.to_string();
        debug!("Challenge restarted");
        Ok(())
    }

    /// Abort the attempt. Nothing is submitted.
    pub fn cancel(&mut self) {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.state = ChallengeState::Cancelled;
            info!(trail_len = attempt.trail.len(), "Challenge cancelled");
        }
    }

    /// Mark the attempt completed once its result has been acknowledged.
    pub fn complete(&mut self) {
        if let Some(attempt) = self.attempt.as_mut() {
            if attempt.state.is_live() {
                attempt.state = ChallengeState::Completed;
                info!(trail_len = attempt.trail.len(), "Challenge completed");
            }
        }
    }

    pub fn state(&self) -> ChallengeState {
        self.attempt
            .as_ref()
            .map(|a| a.state)
            .unwrap_or(ChallengeState::Idle)
    }

    pub fn attempt(&self) -> Option<&ChallengeAttempt> {
        self.attempt.as_ref()
    }

    /// Status line shown under the canvas
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

impl<R: Rng> PointerInput for DragChallenge<R> {
    fn on_pointer_down(&mut self, at: Point, _t: f64) {
        let radius = self.params.capture_radius;
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.state == ChallengeState::Armed && at.distance_to(&attempt.marker) < radius {
            attempt.state = ChallengeState::Dragging;
            self.status = MSG_DRAGGING.to_string();
            debug!(x = at.x, y = at.y, "Marker grabbed");
        }
    }

    fn on_pointer_move(&mut self, at: Point, t: f64) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.state != ChallengeState::Dragging {
            return;
        }
        attempt.marker = at;
        if attempt.started_at.is_none() {
            attempt.started_at = Some(t);
        }
        attempt.trail.push(TrailPoint { x: at.x, y: at.y, t });
    }

    fn on_pointer_up(&mut self, _at: Point, _t: f64) {
        if let Some(attempt) = self.attempt.as_mut() {
            if attempt.state == ChallengeState::Dragging {
                attempt.state = ChallengeState::Armed;
            }
        }
    }
}
