//! Transport abstraction for pluggable stream I/O.

use std::{
    io::{self, IoSlice},
    net::SocketAddr,
};

use crate::{
    constants::DEFAULT_WRITEV_LIMIT,
    options::{SocketOption, SocketOptionKey},
};

/// Low-level connected byte-stream socket abstraction.
///
/// This trait allows various transports (TCP, in-memory mocks, etc.) to be
/// plugged into the channel without coupling to a concrete implementation.
///
/// All I/O is strictly non-blocking: `Ok(Some(n))` means the kernel moved
/// `n` bytes (`n` may be 0, and a read of 0 is end-of-stream), `Ok(None)`
/// means the operation would block and nothing happened, and `Err` is a
/// syscall failure.
pub trait StreamSocket {
    /// Binds the socket's local endpoint.
    fn bind(&mut self, address: SocketAddr) -> io::Result<()>;

    /// Reads bytes into `buf`. A result of `Ok(Some(0))` signals end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;

    /// Writes bytes from `buf`.
    fn write(&mut self, buf: &[u8]) -> io::Result<Option<usize>>;

    /// Gathering write transmitting the buffers in order with one syscall.
    fn writev(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<Option<usize>>;

    /// Max buffers accepted by a single `writev` call.
    fn writev_limit(&self) -> usize {
        DEFAULT_WRITEV_LIMIT
    }

    /// Closes the socket.
    fn close(&mut self) -> io::Result<()>;

    /// Returns the local endpoint address.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Returns the remote endpoint address.
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// Applies a socket-level option.
    fn set_option(&mut self, option: &SocketOption) -> io::Result<()>;

    /// Reads back a socket-level option.
    fn get_option(&self, key: SocketOptionKey) -> io::Result<SocketOption>;
}
