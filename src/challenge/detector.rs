//! Completion Detector
//!
//! Polled on a fixed interval instead of on every pointer move, so "is the
//! marker at the goal" is decoupled from the motion stream and detection
//! lags the goal by at most one interval.

use super::state::ChallengeAttempt;
use std::time::Duration;

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Default minimum trail length before completion is considered
pub const DEFAULT_MIN_TRAIL_POINTS: usize = 20;
/// Default distance to the end point that counts as arrival
pub const DEFAULT_END_THRESHOLD: f64 = 18.0;

/// Completion rule for a drag attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionDetector {
    pub interval: Duration,
    /// Trails shorter than this never complete, even when the marker
    /// starts inside the end threshold
    pub min_trail_points: usize,
    pub end_threshold: f64,
}

impl Default for CompletionDetector {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            min_trail_points: DEFAULT_MIN_TRAIL_POINTS,
            end_threshold: DEFAULT_END_THRESHOLD,
        }
    }
}

impl CompletionDetector {
    /// Distance from the newest trail point to the path end, if any point exists
    pub fn distance_to_end(&self, attempt: &ChallengeAttempt) -> Option<f64> {
        attempt
            .trail()
            .last()
            .map(|p| p.position().distance_to(&attempt.path().end))
    }

    /// One polling tick: true when the attempt should be finalized.
    pub fn check(&self, attempt: &ChallengeAttempt) -> bool {
        if !attempt.in_progress() || attempt.trail().len() < self.min_trail_points {
            return false;
        }
        matches!(self.distance_to_end(attempt), Some(d) if d < self.end_threshold)
    }
}
