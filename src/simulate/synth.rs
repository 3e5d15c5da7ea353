//! Synthetic input generation
//!
//! Two motion profiles stand in for a real user when driving the collector
//! from the command line:
//!
//! - `Human`: jittered positions, variable inter-event timing, typed input
//! - `Bot`: perfectly linear motion, fixed timing, pasted input
//!
//! Timing ranges: human keystrokes 80-300 ms apart and pointer steps
//! 10-50 ms apart; bots use fixed 20 ms keystrokes and 16 ms pointer steps.

use crate::capture::types::{InputEvent, PointerEvent};
use crate::challenge::path::{PathSpec, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const HUMAN_JITTER: f64 = 2.0;
const BOT_STEP_MS: f64 = 16.0;
const BOT_KEY_MS: f64 = 20.0;

/// Which kind of user to imitate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MotionProfile {
    #[default]
    Human,
    Bot,
}

/// Generates input events for one profile
#[derive(Debug, Clone)]
pub struct InputSynthesizer<R = StdRng> {
    rng: R,
    profile: MotionProfile,
}

impl InputSynthesizer<StdRng> {
    pub fn new(profile: MotionProfile) -> Self {
        Self::with_rng(profile, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(profile: MotionProfile, seed: u64) -> Self {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> InputSynthesizer<R> {
    pub fn with_rng(profile: MotionProfile, rng: R) -> Self {
        Self { rng, profile }
    }

    pub fn profile(&self) -> MotionProfile {
        self.profile
    }

    fn step_delay(&mut self) -> f64 {
        match self.profile {
            MotionProfile::Human => self.rng.random_range(10.0..50.0),
            MotionProfile::Bot => BOT_STEP_MS,
        }
    }

    fn key_delay(&mut self) -> f64 {
        match self.profile {
            MotionProfile::Human => self.rng.random_range(80.0..300.0),
            MotionProfile::Bot => BOT_KEY_MS,
        }
    }

    fn jitter(&mut self, p: Point) -> Point {
        match self.profile {
            MotionProfile::Human => Point::new(
                p.x + self.rng.random_range(-HUMAN_JITTER..=HUMAN_JITTER),
                p.y + self.rng.random_range(-HUMAN_JITTER..=HUMAN_JITTER),
            ),
            MotionProfile::Bot => p,
        }
    }

    /// Pointer moves from `from` to `to` in `steps` steps, first stamp after `t0`.
    pub fn pointer_moves(&mut self, from: Point, to: Point, steps: usize, t0: f64) -> Vec<PointerEvent> {
        let steps = steps.max(1);
        let mut t = t0;
        (1..=steps)
            .map(|i| {
                let f = i as f64 / steps as f64;
                let p = self.jitter(Point::new(
                    from.x + (to.x - from.x) * f,
                    from.y + (to.y - from.y) * f,
                ));
                t += self.step_delay();
                PointerEvent::moved(p.x, p.y, t)
            })
            .collect()
    }

    /// One keydown per character of `text`
    pub fn keystrokes(&mut self, text: &str, t0: f64) -> Vec<InputEvent> {
        let mut t = t0;
        text.chars()
            .map(|c| {
                t += self.key_delay();
                InputEvent::KeyDown { key: c.to_string(), t }
            })
            .collect()
    }

    /// Passive activity while filling the payment form: wander to each field,
    /// then enter the amount and the beneficiary. Bots paste the beneficiary.
    pub fn form_fill(&mut self, amount: &str, beneficiary: &str, t0: f64) -> Vec<InputEvent> {
        let waypoints = [
            Point::new(120.0, 90.0),
            Point::new(420.0, 210.0),
            Point::new(430.0, 290.0),
            Point::new(520.0, 380.0),
        ];
        let mut events = Vec::new();
        let mut t = t0;
        let mut at = Point::new(20.0, 20.0);

        for (i, target) in waypoints.iter().enumerate() {
            let steps = match self.profile {
                MotionProfile::Human => self.rng.random_range(18..40),
                MotionProfile::Bot => 20,
            };
            let moves = self.pointer_moves(at, *target, steps, t);
            t = moves.last().map_or(t, |m| m.t);
            events.extend(moves.into_iter().map(InputEvent::Pointer));
            at = *target;

            match i {
                1 => {
                    let keys = self.keystrokes(amount, t);
                    t = last_key_time(&keys).unwrap_or(t);
                    events.extend(keys);
                }
                2 => match self.profile {
                    MotionProfile::Human => {
                        let keys = self.keystrokes(beneficiary, t);
                        t = last_key_time(&keys).unwrap_or(t);
                        events.extend(keys);
                    }
                    MotionProfile::Bot => events.push(InputEvent::Paste),
                },
                _ => {}
            }
        }
        events
    }

    /// A full drag gesture over the challenge: press on the start, move
    /// through `steps` points, release at the end.
    ///
    /// Humans follow the curve; bots cut straight from start to end.
    pub fn drag_gesture(&mut self, path: &PathSpec, steps: usize, t0: f64) -> Vec<PointerEvent> {
        let steps = steps.max(1);
        let mut t = t0;
        let mut events = Vec::with_capacity(steps + 2);
        events.push(PointerEvent::down(path.start.x, path.start.y, t));
        for i in 1..=steps {
            let f = i as f64 / steps as f64;
            let p = match self.profile {
                MotionProfile::Human => self.jitter(path.point_at(f)),
                MotionProfile::Bot => Point::new(
                    path.start.x + (path.end.x - path.start.x) * f,
                    path.start.y + (path.end.y - path.start.y) * f,
                ),
            };
            t += self.step_delay();
            events.push(PointerEvent::moved(p.x, p.y, t));
        }
        let last = events.last().copied().unwrap_or(events[0]);
        events.push(PointerEvent::up(last.x, last.y, last.t + self.step_delay()));
        events
    }
}

fn last_key_time(events: &[InputEvent]) -> Option<f64> {
    events.iter().rev().find_map(|e| match e {
        InputEvent::KeyDown { t, .. } => Some(*t),
        _ => None,
    })
}
