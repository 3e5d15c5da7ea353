//! Monotonic timing module
//!
//! Input events are stamped with fractional milliseconds since the session
//! origin, the same unit the collector expects for `t` and `dt` fields.

pub mod clock;

pub use clock::MonotonicClock;
