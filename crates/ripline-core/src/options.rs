//! Typed socket-level options.
//!
//! Options are a closed set of tagged variants rather than an open
//! runtime-typed registry; an option a transport cannot honor is a
//! programmer error and panics in the transport implementation.

use std::time::Duration;

/// Socket-level options passed through to the operating system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketOption {
    /// TCP_NODELAY: disable Nagle's algorithm.
    NoDelay(bool),
    /// SO_RCVBUF: kernel receive buffer size in bytes.
    RecvBufferSize(usize),
    /// SO_SNDBUF: kernel send buffer size in bytes.
    SendBufferSize(usize),
    /// SO_KEEPALIVE: enable keepalive probes.
    KeepAlive(bool),
    /// IP_TTL: time-to-live for outgoing packets.
    Ttl(u32),
    /// SO_LINGER: close-time linger duration, None to disable.
    Linger(Option<Duration>),
}

impl SocketOption {
    /// Returns the key identifying this option's slot.
    pub fn key(&self) -> SocketOptionKey {
        match self {
            SocketOption::NoDelay(_) => SocketOptionKey::NoDelay,
            SocketOption::RecvBufferSize(_) => SocketOptionKey::RecvBufferSize,
            SocketOption::SendBufferSize(_) => SocketOptionKey::SendBufferSize,
            SocketOption::KeepAlive(_) => SocketOptionKey::KeepAlive,
            SocketOption::Ttl(_) => SocketOptionKey::Ttl,
            SocketOption::Linger(_) => SocketOptionKey::Linger,
        }
    }
}

/// Keys naming the socket-level option slots, used for reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketOptionKey {
    /// TCP_NODELAY.
    NoDelay,
    /// SO_RCVBUF.
    RecvBufferSize,
    /// SO_SNDBUF.
    SendBufferSize,
    /// SO_KEEPALIVE.
    KeepAlive,
    /// IP_TTL.
    Ttl,
    /// SO_LINGER.
    Linger,
}
