use std::default::Default;

use crate::constants::{
    DEFAULT_MAX_MESSAGES_PER_READ, DEFAULT_POOLED_BUFFERS, DEFAULT_RECV_BUFFER_SIZE,
    DEFAULT_WRITEV_LIMIT, MAX_RECV_BUFFER_SIZE, MIN_RECV_BUFFER_SIZE,
};

#[derive(Clone, Debug)]
/// Configuration options to tune channel behavior.
pub struct ChannelConfig {
    /// Automatically re-request a read after each read batch completes.
    pub auto_read: bool,
    /// Max read attempts per readiness notification.
    pub max_messages_per_read: u32,
    /// Max buffers offered to a single gathering write.
    pub writev_limit: usize,
    /// Receive buffer capacity in bytes. The fixed strategy uses it for
    /// every read; the adaptive strategy uses it as the initial guess.
    pub recv_buffer_size: usize,
    /// Lower clamp for adaptive receive sizing.
    pub recv_buffer_min: usize,
    /// Upper clamp for adaptive receive sizing.
    pub recv_buffer_max: usize,
    /// Use adaptive receive sizing instead of the fixed strategy.
    pub adaptive_recv: bool,
    /// Max recycled read buffers kept by the pool.
    pub max_pooled_buffers: usize,
    /// Socket receive buffer size in bytes (None = use system default).
    /// Corresponds to SO_RCVBUF socket option.
    pub socket_recv_buffer_size: Option<usize>,
    /// Socket send buffer size in bytes (None = use system default).
    /// Corresponds to SO_SNDBUF socket option.
    pub socket_send_buffer_size: Option<usize>,
    /// Disable Nagle's algorithm (default: false).
    /// Corresponds to TCP_NODELAY socket option.
    pub socket_nodelay: bool,
    /// Enable keepalive probes (default: false).
    /// Corresponds to SO_KEEPALIVE socket option.
    pub socket_keepalive: bool,
    /// Time-to-live for outgoing packets (None = use system default).
    /// Corresponds to IP_TTL socket option.
    pub socket_ttl: Option<u32>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            auto_read: true,
            max_messages_per_read: DEFAULT_MAX_MESSAGES_PER_READ,
            writev_limit: DEFAULT_WRITEV_LIMIT,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            recv_buffer_min: MIN_RECV_BUFFER_SIZE,
            recv_buffer_max: MAX_RECV_BUFFER_SIZE,
            adaptive_recv: false,
            max_pooled_buffers: DEFAULT_POOLED_BUFFERS,
            socket_recv_buffer_size: None, // Use system default
            socket_send_buffer_size: None, // Use system default
            socket_nodelay: false,
            socket_keepalive: false,
            socket_ttl: None, // Use system default
        }
    }
}
