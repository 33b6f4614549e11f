//! Byte channel abstraction and the TCP implementation on top of mio.
//!
//! The engine only needs a non-blocking, bidirectional byte stream where
//! "would block" is a normal outcome. Dropping a channel closes it.

use crate::config::Config;
use crate::error::ServerError;
use mio::net::{TcpListener, TcpStream};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io::{self, Read};
use std::net::SocketAddr;
use tracing::debug;

/// Outcome of a single non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recv {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// Nothing available right now.
    WouldBlock,
    /// Peer performed an orderly shutdown.
    Closed,
}

/// A non-blocking bidirectional byte stream owned by one connection.
pub trait Channel {
    /// Receive into `buf`. Transport errors are returned as `Err`.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Recv>;

    /// Send from `buf`, returning the number of bytes accepted by the transport.
    ///
    /// `more` hints that further data follows immediately and may be coalesced.
    /// A full send buffer is reported as `io::ErrorKind::WouldBlock`.
    fn send(&mut self, buf: &[u8], more: bool) -> io::Result<usize>;

    /// Remote address, if the transport knows it.
    fn peer_addr(&self) -> Option<SocketAddr>;
}

/// Source of newly accepted channels.
pub trait Listener {
    type Channel: Channel;

    /// Accept one pending connection. `Ok(None)` means nothing is pending.
    fn accept(&mut self) -> io::Result<Option<Self::Channel>>;

    fn local_addr(&self) -> Option<SocketAddr>;
}

/// An accepted TCP connection.
#[derive(Debug)]
pub struct TcpChannel {
    stream: TcpStream,
}

impl TcpChannel {
    /// Wrap an accepted stream, disabling Nagle so replies are not delayed.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

#[cfg(target_os = "linux")]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(target_os = "linux"))]
const SEND_FLAGS: libc::c_int = 0;

#[cfg(target_os = "linux")]
const MORE_FLAG: libc::c_int = libc::MSG_MORE;
#[cfg(not(target_os = "linux"))]
const MORE_FLAG: libc::c_int = 0;

impl Channel for TcpChannel {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Recv> {
        match self.stream.read(buf) {
            Ok(0) => Ok(Recv::Closed),
            Ok(n) => Ok(Recv::Data(n)),
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(Recv::WouldBlock)
            }
            Err(e) => Err(e),
        }
    }

    fn send(&mut self, buf: &[u8], more: bool) -> io::Result<usize> {
        let flags = if more { SEND_FLAGS | MORE_FLAG } else { SEND_FLAGS };
        SockRef::from(&self.stream).send_with_flags(buf, flags)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr().ok()
    }
}

/// Non-blocking TCP listening socket.
#[derive(Debug)]
pub struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    /// Create, configure, bind and listen on `addr`.
    pub fn bind(addr: SocketAddr, backlog: i32) -> Result<Self, ServerError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(ServerError::Socket)?;

        socket.set_nonblocking(true).map_err(ServerError::NonBlocking)?;
        socket.set_reuse_address(true).map_err(ServerError::ReuseAddr)?;
        socket.bind(&addr.into()).map_err(ServerError::Bind)?;
        socket.listen(backlog).map_err(ServerError::Listen)?;

        let listener: std::net::TcpListener = socket.into();
        Ok(Self {
            listener: TcpListener::from_std(listener),
        })
    }

    /// Bind using the listen address and backlog from `config`.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let addr: SocketAddr =
            config
                .listen
                .parse()
                .map_err(|source| ServerError::InvalidAddress {
                    addr: config.listen.clone(),
                    source,
                })?;
        Self::bind(addr, config.backlog)
    }
}

impl Listener for TcpAcceptor {
    type Channel = TcpChannel;

    fn accept(&mut self) -> io::Result<Option<TcpChannel>> {
        match self.listener.accept() {
            Ok((stream, peer)) => match TcpChannel::new(stream) {
                Ok(channel) => Ok(Some(channel)),
                Err(e) => {
                    debug!(peer = %peer, error = %e, "setsockopt TCP_NODELAY failed, dropping");
                    Err(e)
                }
            },
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }
}
