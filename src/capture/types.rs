//! Core types for telemetry capture
//!
//! Defines the input events fed into the recorder and the drag challenge,
//! and the samples kept in the passive telemetry buffers.

use serde::{Deserialize, Serialize};

/// Pointer event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    /// Primary button pressed
    Down,
    /// Pointer moved (with or without a button held)
    Move,
    /// Primary button released
    Up,
}

/// A pointer event in surface coordinates, stamped on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    /// Monotonic arrival time (ms)
    pub t: f64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, t: f64) -> Self {
        Self { kind: PointerKind::Down, x, y, t }
    }

    pub fn moved(x: f64, y: f64, t: f64) -> Self {
        Self { kind: PointerKind::Move, x, y, t }
    }

    pub fn up(x: f64, y: f64, t: f64) -> Self {
        Self { kind: PointerKind::Up, x, y, t }
    }
}

/// Input events observed during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Pointer(PointerEvent),
    /// Key pressed; `key` is the logical key value ("a", "Enter", "Shift")
    KeyDown { key: String, t: f64 },
    /// Clipboard paste into any field
    Paste,
}

impl InputEvent {
    /// Check if this is a pointer movement event
    pub fn is_pointer_move(&self) -> bool {
        matches!(self, InputEvent::Pointer(p) if p.kind == PointerKind::Move)
    }

    /// Check if this is a keyboard event
    pub fn is_keyboard(&self) -> bool {
        matches!(self, InputEvent::KeyDown { .. })
    }
}

/// One buffered pointer-move sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    /// Monotonic time of the move (ms)
    pub t: f64,
    /// Delta to the previously recorded move (ms); 0 for the first sample
    pub dt: f64,
}

/// One buffered keydown sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySample {
    #[serde(rename = "k")]
    pub key: String,
    pub t: f64,
}
