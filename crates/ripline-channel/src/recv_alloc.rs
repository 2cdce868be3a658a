//! Receive-buffer sizing strategies.
//!
//! Each read attempt gets a fresh buffer; the strategy decides its
//! capacity. The adaptive strategy grows eagerly when reads fill the
//! buffer and shrinks only after the small reads persist, so a single
//! quiet iteration does not throw away a well-tuned size.

use ripline_core::constants::{
    DEFAULT_RECV_BUFFER_SIZE, MAX_RECV_BUFFER_SIZE, MIN_RECV_BUFFER_SIZE,
};

/// Strategy deciding the capacity of the next read buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecvAllocator {
    /// Same capacity for every read.
    Fixed(FixedRecvAllocator),
    /// Capacity adapts to observed read sizes.
    Adaptive(AdaptiveRecvAllocator),
}

impl RecvAllocator {
    /// Creates a fixed strategy with the given capacity.
    pub fn fixed(capacity: usize) -> Self {
        RecvAllocator::Fixed(FixedRecvAllocator::new(capacity))
    }

    /// Creates an adaptive strategy starting at `initial`, clamped to `[min, max]`.
    pub fn adaptive(min: usize, initial: usize, max: usize) -> Self {
        RecvAllocator::Adaptive(AdaptiveRecvAllocator::new(min, initial, max))
    }

    /// Returns the capacity for the next read buffer.
    pub fn next_capacity(&self) -> usize {
        match self {
            RecvAllocator::Fixed(fixed) => fixed.capacity(),
            RecvAllocator::Adaptive(adaptive) => adaptive.next_capacity(),
        }
    }

    /// Records how many bytes the last read produced.
    pub fn record_read(&mut self, bytes: usize) {
        match self {
            RecvAllocator::Fixed(_) => {}
            RecvAllocator::Adaptive(adaptive) => adaptive.record_read(bytes),
        }
    }
}

impl Default for RecvAllocator {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECV_BUFFER_SIZE)
    }
}

/// Fixed-capacity sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedRecvAllocator {
    capacity: usize,
}

impl FixedRecvAllocator {
    /// Creates a fixed strategy. Panics on a zero capacity.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "receive buffer capacity must be positive");
        Self { capacity }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Adaptive sizing: grow after a full read, shrink after two consecutive
/// reads that used less than half the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveRecvAllocator {
    min: usize,
    max: usize,
    current: usize,
    small_reads: u8,
}

impl AdaptiveRecvAllocator {
    /// Creates an adaptive strategy starting at `initial`, clamped to `[min, max]`.
    pub fn new(min: usize, initial: usize, max: usize) -> Self {
        assert!(min > 0, "minimum receive capacity must be positive");
        assert!(min <= max, "minimum receive capacity exceeds maximum");
        Self { min, max, current: initial.clamp(min, max), small_reads: 0 }
    }

    /// Returns the capacity for the next read buffer.
    pub fn next_capacity(&self) -> usize {
        self.current
    }

    /// Records how many bytes the last read produced.
    pub fn record_read(&mut self, bytes: usize) {
        if bytes >= self.current {
            // The buffer filled: likely more is waiting, grow eagerly.
            self.current = (self.current + self.current / 2).min(self.max);
            self.small_reads = 0;
        } else if bytes * 2 <= self.current {
            self.small_reads += 1;
            if self.small_reads >= 2 {
                self.current = (self.current / 2).max(self.min);
                self.small_reads = 0;
            }
        } else {
            self.small_reads = 0;
        }
    }
}

impl Default for AdaptiveRecvAllocator {
    fn default() -> Self {
        Self::new(MIN_RECV_BUFFER_SIZE, DEFAULT_RECV_BUFFER_SIZE, MAX_RECV_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_capacity_never_changes() {
        let mut alloc = RecvAllocator::fixed(512);
        assert_eq!(alloc.next_capacity(), 512);

        alloc.record_read(512);
        alloc.record_read(1);
        alloc.record_read(1);
        assert_eq!(alloc.next_capacity(), 512);
    }

    #[test]
    fn test_adaptive_grows_after_full_read() {
        let mut alloc = AdaptiveRecvAllocator::new(64, 1024, 65536);
        alloc.record_read(1024);
        assert_eq!(alloc.next_capacity(), 1536);
    }

    #[test]
    fn test_adaptive_shrinks_only_after_two_small_reads() {
        let mut alloc = AdaptiveRecvAllocator::new(64, 1024, 65536);

        alloc.record_read(100);
        assert_eq!(alloc.next_capacity(), 1024);

        alloc.record_read(100);
        assert_eq!(alloc.next_capacity(), 512);
    }

    #[test]
    fn test_adaptive_moderate_read_resets_shrink_streak() {
        let mut alloc = AdaptiveRecvAllocator::new(64, 1024, 65536);

        alloc.record_read(100);
        alloc.record_read(800); // more than half: not a small read
        alloc.record_read(100);
        assert_eq!(alloc.next_capacity(), 1024);
    }

    #[test]
    fn test_adaptive_respects_bounds() {
        let mut alloc = AdaptiveRecvAllocator::new(256, 512, 1024);

        for _ in 0..10 {
            let capacity = alloc.next_capacity();
            alloc.record_read(capacity);
        }
        assert_eq!(alloc.next_capacity(), 1024);

        for _ in 0..20 {
            alloc.record_read(1);
        }
        assert_eq!(alloc.next_capacity(), 256);
    }

    #[test]
    fn test_adaptive_initial_is_clamped() {
        let alloc = AdaptiveRecvAllocator::new(256, 16, 1024);
        assert_eq!(alloc.next_capacity(), 256);

        let alloc = AdaptiveRecvAllocator::new(256, 4096, 1024);
        assert_eq!(alloc.next_capacity(), 1024);
    }
}
