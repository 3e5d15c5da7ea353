//! Passive Telemetry Recorder
//!
//! Owns the pointer and key rings plus the paste counter. Every operation is
//! O(1) amortized and keeps both rings within capacity.

use super::ring_buffer::SampleRing;
use super::types::{InputEvent, KeySample, PointerKind, PointerSample};
use tracing::debug;

/// Pointer ring capacity
pub const MOUSE_CAPACITY: usize = 1200;
/// Key ring capacity
pub const KEY_CAPACITY: usize = 600;

/// Counters that live for the whole session (a page lifetime).
///
/// Only `reset` brings them back to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryState {
    paste_count: u64,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one paste event
    pub fn record_paste(&mut self) {
        self.paste_count = self.paste_count.saturating_add(1);
    }

    pub fn paste_count(&self) -> u64 {
        self.paste_count
    }

    /// Full reset, equivalent to a page reload
    pub fn reset(&mut self) {
        self.paste_count = 0;
    }
}

/// Bounded recorder for passive interaction telemetry
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    mouse: SampleRing<PointerSample>,
    keys: SampleRing<KeySample>,
    /// Time of the last recorded move; survives eviction of that sample
    last_move_t: Option<f64>,
    state: TelemetryState,
}

impl TelemetryRecorder {
    /// Create a recorder with the default capacities (1200 moves, 600 keys)
    pub fn new() -> Self {
        Self::with_capacities(MOUSE_CAPACITY, KEY_CAPACITY)
    }

    /// Create a recorder with custom ring capacities
    ///
    /// # Panics
    /// Panics if either capacity is zero
    pub fn with_capacities(mouse_capacity: usize, key_capacity: usize) -> Self {
        Self {
            mouse: SampleRing::with_capacity(mouse_capacity),
            keys: SampleRing::with_capacity(key_capacity),
            last_move_t: None,
            state: TelemetryState::new(),
        }
    }

    /// Record a pointer move at `t_now` (ms).
    pub fn record_pointer_move(&mut self, x: f64, y: f64, t_now: f64) {
        let dt = match self.last_move_t {
            Some(prev) => t_now - prev,
            None => 0.0,
        };
        self.last_move_t = Some(t_now);
        self.mouse.push(PointerSample { x, y, t: t_now, dt });
    }

    /// Record a keydown at `t_now` (ms).
    pub fn record_key_down(&mut self, key: impl Into<String>, t_now: f64) {
        self.keys.push(KeySample {
            key: key.into(),
            t: t_now,
        });
    }

    /// Count a paste event.
    pub fn record_paste(&mut self) {
        self.state.record_paste();
        debug!(paste_count = self.state.paste_count(), "Paste recorded");
    }

    /// Route a raw input event to the matching record operation.
    ///
    /// Pointer down/up are not part of passive telemetry and are ignored.
    pub fn observe(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Pointer(p) if p.kind == PointerKind::Move => {
                self.record_pointer_move(p.x, p.y, p.t)
            }
            InputEvent::Pointer(_) => {}
            InputEvent::KeyDown { key, t } => self.record_key_down(key.as_str(), *t),
            InputEvent::Paste => self.record_paste(),
        }
    }

    /// Most recent `n` pointer samples, oldest first. Does not mutate.
    pub fn snapshot_mouse(&self, n: usize) -> Vec<PointerSample> {
        self.mouse.latest(n)
    }

    /// Most recent `n` key samples, oldest first. Does not mutate.
    pub fn snapshot_keys(&self, n: usize) -> Vec<KeySample> {
        self.keys.latest(n)
    }

    pub fn paste_count(&self) -> u64 {
        self.state.paste_count()
    }

    pub fn mouse_len(&self) -> usize {
        self.mouse.len()
    }

    pub fn keys_len(&self) -> usize {
        self.keys.len()
    }

    pub fn mouse(&self) -> &SampleRing<PointerSample> {
        &self.mouse
    }

    pub fn keys(&self) -> &SampleRing<KeySample> {
        &self.keys
    }

    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    /// Drop all buffered samples and counters (page reload)
    pub fn reset(&mut self) {
        self.mouse.clear();
        self.keys.clear();
        self.last_move_t = None;
        self.state.reset();
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}
