use std::{
    io::{self, IoSlice, Read},
    net::{Shutdown, SocketAddr, TcpStream},
};

use ripline_core::{
    options::{SocketOption, SocketOptionKey},
    transport::StreamSocket,
};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Maps a non-blocking syscall result into the channel's readiness shape.
fn nonblocking<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(err) => Err(err),
    }
}

/// A connected, non-blocking TCP socket implementing [`StreamSocket`].
///
/// Wraps a `socket2::Socket` so that typed socket options pass straight
/// through to `setsockopt`/`getsockopt`.
#[derive(Debug)]
pub struct TcpStreamSocket {
    socket: Socket,
}

impl TcpStreamSocket {
    /// Connects to `address` and switches the stream to non-blocking mode.
    ///
    /// The connect itself blocks; channels own sockets that are already
    /// connected, and establishment policy stays with the caller.
    pub fn connect(address: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
        socket.connect(&SockAddr::from(address))?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    /// Adopts an already-connected std stream, switching it to non-blocking mode.
    pub fn from_std(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self { socket: Socket::from(stream) })
    }
}

impl StreamSocket for TcpStreamSocket {
    fn bind(&mut self, address: SocketAddr) -> io::Result<()> {
        self.socket.bind(&SockAddr::from(address))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        nonblocking(self.socket.read(buf))
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<Option<usize>> {
        nonblocking(self.socket.send(buf))
    }

    fn writev(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<Option<usize>> {
        nonblocking(self.socket.send_vectored(bufs))
    }

    fn close(&mut self) -> io::Result<()> {
        self.socket.shutdown(Shutdown::Both)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()?.as_socket().ok_or_else(non_inet)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()?.as_socket().ok_or_else(non_inet)
    }

    fn set_option(&mut self, option: &SocketOption) -> io::Result<()> {
        match option {
            SocketOption::NoDelay(enabled) => self.socket.set_nodelay(*enabled),
            SocketOption::RecvBufferSize(size) => self.socket.set_recv_buffer_size(*size),
            SocketOption::SendBufferSize(size) => self.socket.set_send_buffer_size(*size),
            SocketOption::KeepAlive(enabled) => self.socket.set_keepalive(*enabled),
            SocketOption::Ttl(ttl) => self.socket.set_ttl(*ttl),
            SocketOption::Linger(linger) => self.socket.set_linger(*linger),
        }
    }

    fn get_option(&self, key: SocketOptionKey) -> io::Result<SocketOption> {
        Ok(match key {
            SocketOptionKey::NoDelay => SocketOption::NoDelay(self.socket.nodelay()?),
            SocketOptionKey::RecvBufferSize => {
                SocketOption::RecvBufferSize(self.socket.recv_buffer_size()?)
            }
            SocketOptionKey::SendBufferSize => {
                SocketOption::SendBufferSize(self.socket.send_buffer_size()?)
            }
            SocketOptionKey::KeepAlive => SocketOption::KeepAlive(self.socket.keepalive()?),
            SocketOptionKey::Ttl => SocketOption::Ttl(self.socket.ttl()?),
            SocketOptionKey::Linger => SocketOption::Linger(self.socket.linger()?),
        })
    }
}

fn non_inet() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "socket address is not an inet address")
}
