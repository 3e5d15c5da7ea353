//! Configuration Management

use crate::capture::recorder::{KEY_CAPACITY, MOUSE_CAPACITY};
use crate::challenge::detector::CompletionDetector;
use crate::challenge::path::{DEFAULT_MARGIN, DEFAULT_POLYLINE_STEPS};
use crate::challenge::render::{GuideStyle, StrokeStyle};
use crate::challenge::state::{ChallengeParams, DEFAULT_CAPTURE_RADIUS};
use crate::session::context::ScreenInfo;
use crate::stream::live_log::DEFAULT_MAX_ENTRIES;
use crate::submit::client::DEFAULT_BASE_URL;
use crate::submit::payload::{DEFAULT_CHANNEL, SNAPSHOT_KEY_SAMPLES, SNAPSHOT_MOUSE_SAMPLES};
use crate::workflow::form::FormOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Baseline pointer moves in a synthetic drag
pub const SYNTHETIC_DRAG_STEPS: usize = 40;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Collector endpoint settings
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Passive capture settings
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Drag challenge settings
    #[serde(default)]
    pub challenge: ChallengeConfig,
    /// Live event stream settings
    #[serde(default)]
    pub stream: StreamConfig,
    /// Reported screen geometry
    #[serde(default)]
    pub screen: ScreenConfig,
}

/// Collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Base URL; `LIVENESS_COLLECTOR_BASE` overrides it at call time
    pub base_url: String,
    /// Request timeout (ms)
    pub timeout_ms: u64,
    /// Channel tag sent with snapshots
    pub channel: String,
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Pointer ring capacity
    pub mouse_capacity: usize,
    /// Key ring capacity
    pub key_capacity: usize,
    /// Pointer samples per snapshot
    pub snapshot_mouse: usize,
    /// Key samples per snapshot
    pub snapshot_keys: usize,
}

/// Challenge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Inset from the canvas border for all path points
    pub margin: f64,
    pub polyline_steps: usize,
    /// Grab radius around the marker
    pub capture_radius: f64,
    /// Distance to the end that completes the attempt
    pub completion_threshold: f64,
    pub min_trail_points: usize,
    pub poll_interval_ms: u64,
    pub marker_radius: f64,
    pub lane_width: f64,
    pub curve_width: f64,
}

/// Live stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub url: String,
    pub max_entries: usize,
}

/// Screen geometry reported in the environment snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mouse_capacity: MOUSE_CAPACITY,
            key_capacity: KEY_CAPACITY,
            snapshot_mouse: SNAPSHOT_MOUSE_SAMPLES,
            snapshot_keys: SNAPSHOT_KEY_SAMPLES,
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        let guide = GuideStyle::default();
        let detector = CompletionDetector::default();
        Self {
            canvas_width: 800.0,
            canvas_height: 480.0,
            margin: DEFAULT_MARGIN,
            polyline_steps: DEFAULT_POLYLINE_STEPS,
            capture_radius: DEFAULT_CAPTURE_RADIUS,
            completion_threshold: detector.end_threshold,
            min_trail_points: detector.min_trail_points,
            poll_interval_ms: detector.interval.as_millis() as u64,
            marker_radius: guide.marker_radius,
            lane_width: guide.lane.width,
            curve_width: guide.curve.width,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        let screen = ScreenInfo::default();
        Self {
            width: screen.width,
            height: screen.height,
            device_pixel_ratio: screen.device_pixel_ratio,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.collector.base_url.trim().is_empty() {
            return Err(crate::Error::Config("base_url must not be empty".to_string()));
        }
        if self.collector.timeout_ms == 0 {
            return Err(crate::Error::Config("timeout_ms must be > 0".to_string()));
        }
        if self.capture.mouse_capacity == 0 || self.capture.key_capacity == 0 {
            return Err(crate::Error::Config("capture capacities must be > 0".to_string()));
        }
        if self.capture.snapshot_mouse > self.capture.mouse_capacity {
            return Err(crate::Error::Config(format!(
                "snapshot_mouse ({}) exceeds mouse_capacity ({})",
                self.capture.snapshot_mouse, self.capture.mouse_capacity
            )));
        }
        if self.capture.snapshot_keys > self.capture.key_capacity {
            return Err(crate::Error::Config(format!(
                "snapshot_keys ({}) exceeds key_capacity ({})",
                self.capture.snapshot_keys, self.capture.key_capacity
            )));
        }
        let c = &self.challenge;
        if c.margin < 0.0 {
            return Err(crate::Error::Config(format!("margin must be >= 0, got {}", c.margin)));
        }
        if c.canvas_width < 4.0 * c.margin || c.canvas_height <= 2.0 * c.margin {
            return Err(crate::Error::Config(format!(
                "canvas {}x{} too small for margin {}",
                c.canvas_width, c.canvas_height, c.margin
            )));
        }
        if c.polyline_steps < 100 {
            return Err(crate::Error::Config(format!(
                "polyline_steps must be >= 100, got {}", c.polyline_steps
            )));
        }
        if c.capture_radius <= 0.0 || c.completion_threshold <= 0.0 {
            return Err(crate::Error::Config(
                "capture_radius and completion_threshold must be > 0".to_string(),
            ));
        }
        if c.min_trail_points == 0 {
            return Err(crate::Error::Config("min_trail_points must be > 0".to_string()));
        }
        if c.poll_interval_ms == 0 {
            return Err(crate::Error::Config("poll_interval_ms must be > 0".to_string()));
        }
        if self.stream.max_entries == 0 {
            return Err(crate::Error::Config("max_entries must be > 0".to_string()));
        }
        if self.screen.device_pixel_ratio <= 0.0 {
            return Err(crate::Error::Config(format!(
                "device_pixel_ratio must be > 0, got {}", self.screen.device_pixel_ratio
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".liveness_collector").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.collector.timeout_ms)
    }

    pub fn screen_info(&self) -> ScreenInfo {
        ScreenInfo {
            width: self.screen.width,
            height: self.screen.height,
            device_pixel_ratio: self.screen.device_pixel_ratio,
        }
    }

    pub fn challenge_params(&self) -> ChallengeParams {
        ChallengeParams {
            canvas_width: self.challenge.canvas_width,
            canvas_height: self.challenge.canvas_height,
            capture_radius: self.challenge.capture_radius,
            polyline_steps: self.challenge.polyline_steps,
        }
    }

    pub fn detector(&self) -> CompletionDetector {
        CompletionDetector {
            interval: Duration::from_millis(self.challenge.poll_interval_ms),
            min_trail_points: self.challenge.min_trail_points,
            end_threshold: self.challenge.completion_threshold,
        }
    }

    /// Pointer moves in a synthetic drag, always enough for the detector
    pub fn drag_steps(&self) -> usize {
        SYNTHETIC_DRAG_STEPS.max(self.challenge.min_trail_points + SYNTHETIC_DRAG_STEPS / 4)
    }

    pub fn guide_style(&self) -> GuideStyle {
        let defaults = GuideStyle::default();
        GuideStyle {
            lane: StrokeStyle {
                width: self.challenge.lane_width,
                ..defaults.lane
            },
            curve: StrokeStyle {
                width: self.challenge.curve_width,
                ..defaults.curve
            },
            marker_radius: self.challenge.marker_radius,
            ..defaults
        }
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            channel: self.collector.channel.clone(),
            mouse_samples: self.capture.snapshot_mouse,
            key_samples: self.capture.snapshot_keys,
        }
    }
}
