#![warn(missing_docs)]

//! ripline-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core utilities shared across all layers:
//! - Configuration types
//! - Error handling
//! - Byte buffers with read cursors
//! - Write completion promises
//! - The socket and pipeline contracts the channel consumes
//!
//! The channel engine itself lives in `ripline-channel`; concrete socket
//! implementations live in `ripline-tcp`.

/// Tuning constants shared across layers.
pub mod constants {
    /// Maximum buffers offered to a single gathering write.
    ///
    /// Matches the conventional platform IOV_MAX.
    pub const DEFAULT_WRITEV_LIMIT: usize = 1024;
    /// Default bound on read attempts per readiness notification.
    ///
    /// Bounds the worst-case starvation a single busy channel can impose
    /// on its event loop.
    pub const DEFAULT_MAX_MESSAGES_PER_READ: u32 = 16;
    /// Default receive buffer capacity in bytes.
    pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2048;
    /// Lower clamp for adaptive receive sizing.
    pub const MIN_RECV_BUFFER_SIZE: usize = 64;
    /// Upper clamp for adaptive receive sizing.
    pub const MAX_RECV_BUFFER_SIZE: usize = 64 * 1024;
    /// Default number of recycled read buffers retained by the pool.
    pub const DEFAULT_POOLED_BUFFERS: usize = 32;
}

/// Byte buffers with a mutable read cursor.
pub mod buffer;
/// One-shot write completion promises.
pub mod completion;
/// Configuration options for channel behavior.
pub mod config;
/// Error types and results.
pub mod error;
/// Typed socket-level options.
pub mod options;
/// Pipeline event dispatch contract.
pub mod pipeline;
/// Buffer pooling for read-path memory reuse.
pub mod pool;
/// Transport abstraction for pluggable stream I/O.
pub mod transport;
