//! Bounded FIFO Ring for Telemetry Samples
//!
//! A fixed-capacity buffer that never grows past its capacity. When full,
//! each insertion evicts exactly one entry: the oldest. This bounds memory
//! for arbitrarily long sessions while always keeping the most recent
//! window of behavior.
//!
//! Unlike a producer/consumer queue, nothing is ever rejected on insert and
//! reads never consume: snapshots copy the tail and leave the ring intact.

use std::collections::VecDeque;

/// Ring buffer statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingStats {
    /// Total samples pushed
    pub pushed: u64,
    /// Samples evicted to make room
    pub evicted: u64,
}

/// Fixed-capacity FIFO-evicting buffer
#[derive(Debug, Clone)]
pub struct SampleRing<T> {
    items: VecDeque<T>,
    capacity: usize,
    stats: RingStats,
}

impl<T> SampleRing<T> {
    /// Create a ring holding at most `capacity` samples
    ///
    /// # Panics
    /// Panics if capacity is zero
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring capacity must be non-zero");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            stats: RingStats::default(),
        }
    }

    /// Append a sample, evicting the oldest one if the ring is full.
    ///
    /// Returns the evicted sample, if any.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.stats.evicted += 1;
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        self.stats.pushed += 1;
        evicted
    }

    /// Most recently pushed sample
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn stats(&self) -> RingStats {
        self.stats
    }

    /// Drop all samples and reset statistics
    pub fn clear(&mut self) {
        self.items.clear();
        self.stats = RingStats::default();
    }
}

impl<T: Clone> SampleRing<T> {
    /// Copy the most recent `n` samples (or fewer), oldest first.
    pub fn latest(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }
}
