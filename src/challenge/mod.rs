//! Drag-path liveness challenge
//!
//! - [`path`]: randomized cubic paths and their polyline sampling
//! - [`render`]: lane/curve/marker drawing on a [`Surface`]
//! - [`state`]: the attempt state machine
//! - [`detector`]: interval-polled completion rule
//! - [`runner`]: async driver that submits the trail once the end is reached

pub mod detector;
pub mod path;
pub mod render;
pub mod runner;
pub mod state;

pub use detector::CompletionDetector;
pub use path::{PathGenerator, PathSpec, Point, Polyline};
pub use render::{GuideStyle, StrokeStyle, Surface, SvgSurface};
pub use runner::{ChallengeCommand, ChallengeOutcome, ChallengeRunner, ChallengeView};
pub use state::{
    ChallengeAttempt, ChallengeParams, ChallengeState, DragChallenge, PointerInput, TrailPoint,
};
