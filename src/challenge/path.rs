//! Randomized Cubic Bezier Paths
//!
//! The challenge path runs from a point on the left margin to a point on the
//! right margin, bent by one control point in the left half and one in the
//! right half of the canvas. Every coordinate stays inside an inset region
//! `margin` units away from the canvas border.
//!
//! The generator takes its random source by injection so tests can pin the
//! geometry; production uses a `StdRng` seeded from the OS.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Default inset from the canvas border
pub const DEFAULT_MARGIN: f64 = 40.0;
/// Default number of parametric steps for the polyline (101 points)
pub const DEFAULT_POLYLINE_STEPS: usize = 100;

/// Point in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Cubic Bezier path definition as sent to the collector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSpec {
    pub start: Point,
    pub end: Point,
    #[serde(rename = "c1")]
    pub control1: Point,
    #[serde(rename = "c2")]
    pub control2: Point,
}

impl PathSpec {
    /// Evaluate the curve at parameter `t` in [0, 1]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        Point {
            x: b0 * self.start.x + b1 * self.control1.x + b2 * self.control2.x + b3 * self.end.x,
            y: b0 * self.start.y + b1 * self.control1.y + b2 * self.control2.y + b3 * self.end.y,
        }
    }

    /// Sample the curve at `steps + 1` uniform parameter values, 0 and 1 included.
    pub fn sample_polyline(&self, steps: usize) -> Polyline {
        let steps = steps.max(1);
        let points = (0..=steps)
            .map(|k| self.point_at(k as f64 / steps as f64))
            .collect();
        Polyline { points }
    }

    /// The four defining points in wire order
    pub fn points(&self) -> [Point; 4] {
        [self.start, self.control1, self.control2, self.end]
    }
}

/// Dense sampling of a path, used for guide rendering and proximity checks
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distance from `p` to the nearest sample on the curve
    pub fn nearest_distance(&self, p: &Point) -> f64 {
        self.points
            .iter()
            .map(|s| s.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Total length of the sampled curve
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

/// Random path generator with an injectable random source
#[derive(Debug, Clone)]
pub struct PathGenerator<R = StdRng> {
    rng: R,
    margin: f64,
}

impl PathGenerator<StdRng> {
    /// Generator backed by a `StdRng` seeded from the thread-local OS-seeded source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic generator for reproducible geometry
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for PathGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PathGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            margin: DEFAULT_MARGIN,
        }
    }

    /// Override the inset margin (clamped to be non-negative)
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Generate a path for a `width` x `height` canvas.
    ///
    /// Fails when the canvas cannot fit the inset region: width must be at
    /// least four margins and height more than two.
    pub fn generate(&mut self, width: f64, height: f64) -> crate::Result<PathSpec> {
        let m = self.margin;
        if !(width.is_finite() && height.is_finite()) || width < 4.0 * m || height <= 2.0 * m {
            return Err(crate::Error::Challenge(format!(
                "canvas {}x{} too small for margin {}",
                width, height, m
            )));
        }

        let half = width / 2.0;
        let span_y = height - 2.0 * m;
        // Control bands leave half a margin between them and the nearest endpoint column
        let left_band = half - 1.5 * m;
        let right_band = half - 1.5 * m;

        let start = Point::new(m, m + self.offset(span_y));
        let end = Point::new(width - m, m + self.offset(span_y));
        let control1 = Point::new(m + self.offset(left_band), m + self.offset(span_y));
        let control2 = Point::new(half + self.offset(right_band), m + self.offset(span_y));

        Ok(PathSpec {
            start,
            end,
            control1,
            control2,
        })
    }

    /// Whole-unit offset in [0, span), or 0 for an empty span
    fn offset(&mut self, span: f64) -> f64 {
        let n = span.floor() as u64;
        if n == 0 {
            0.0
        } else {
            self.rng.random_range(0..n) as f64
        }
    }
}
