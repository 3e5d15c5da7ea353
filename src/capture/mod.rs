//! Passive telemetry capture
//!
//! Pointer moves and keydowns land in bounded FIFO rings; pastes bump a
//! session-lifetime counter. Nothing here blocks or allocates past the
//! configured capacities.

pub mod types;
pub mod ring_buffer;
pub mod recorder;

pub use types::*;
pub use ring_buffer::{RingStats, SampleRing};
pub use recorder::{TelemetryRecorder, TelemetryState, KEY_CAPACITY, MOUSE_CAPACITY};
