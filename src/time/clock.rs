//! Session-relative monotonic clock
//!
//! Timestamps are `f64` milliseconds measured from a process-wide origin that
//! is fixed on first use. They never go backward, and sub-millisecond
//! precision is kept for inter-event deltas.

use std::sync::OnceLock;
use std::time::Instant;

/// Process-wide origin, fixed the first time any clock is read
static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Monotonic clock anchored at the process-wide origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Fix the origin now. Calling this is optional; the first read does it too.
    pub fn init() {
        ORIGIN.get_or_init(Instant::now);
    }

    /// Current time in milliseconds since the origin.
    #[inline]
    pub fn now() -> f64 {
        let origin = ORIGIN.get_or_init(Instant::now);
        origin.elapsed().as_secs_f64() * 1_000.0
    }

    /// Elapsed milliseconds between two readings. Returns 0 if `end < start`.
    #[inline]
    pub fn elapsed_ms(start: f64, end: f64) -> f64 {
        if end >= start {
            end - start
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonicity() {
        MonotonicClock::init();
        let t1 = MonotonicClock::now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let t2 = MonotonicClock::now();
        assert!(t2 > t1, "time must advance");
        assert!(MonotonicClock::elapsed_ms(t1, t2) >= 2.0);
    }

    #[test]
    fn test_elapsed_saturates_on_reversed_input() {
        assert_eq!(MonotonicClock::elapsed_ms(500.0, 100.0), 0.0);
        assert_eq!(MonotonicClock::elapsed_ms(100.0, 100.0), 0.0);
    }
}
