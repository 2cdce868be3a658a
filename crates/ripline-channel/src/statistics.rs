//! Channel activity counters.

/// Counters for a channel's I/O activity.
#[derive(Debug, Clone, Default)]
pub struct ChannelStatistics {
    /// Read syscalls that produced data
    pub reads: u64,
    /// Total bytes read from the socket
    pub bytes_read: u64,
    /// Writes accepted into the pending queue
    pub writes_enqueued: u64,
    /// Total bytes the socket accepted
    pub bytes_written: u64,
    /// User- or loop-initiated drain attempts
    pub flushes: u64,
    /// Drain attempts that ended in backpressure
    pub partial_flushes: u64,
}

impl ChannelStatistics {
    /// Resets all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
