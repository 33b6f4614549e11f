//! Host-facing connection handle.
//!
//! A `Connection` lives in a fixed pool slot and is reused across peers. The
//! host sees it only through callbacks: it may write replies, close it, and
//! keep per-connection state in `data`.

use super::channel::Channel;
use crate::error::reason;
use std::fmt::Write as _;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// How long a write keeps retrying a peer that accepts no bytes before the
/// connection is closed with `send timeout`.
pub const SEND_STALL_TIMEOUT: Duration = Duration::from_millis(100);

/// One accepted peer and its host-defined payload.
pub struct Connection<D, C> {
    /// Host-defined state, reset to `D::default()` on every accept.
    pub data: D,
    channel: Option<C>,
    peer: Option<SocketAddr>,
    slot: usize,
    last_error: String,
}

impl<D: Default, C: Channel> Connection<D, C> {
    pub(crate) fn new(slot: usize) -> Self {
        Self {
            data: D::default(),
            channel: None,
            peer: None,
            slot,
            last_error: String::with_capacity(64),
        }
    }

    /// Take ownership of a freshly accepted channel.
    pub(crate) fn open(&mut self, channel: C) {
        self.peer = channel.peer_addr();
        self.channel = Some(channel);
        self.data = D::default();
        self.last_error.clear();
    }

    /// Remote address captured at accept time. Still available after close.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Storage identity of the pool slot backing this connection.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Why the connection was closed. Empty while it is open.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Write all of `data`.
    ///
    /// `more` hints that another write follows immediately. Any failure closes
    /// the connection and is returned.
    pub fn write(&mut self, mut data: &[u8], more: bool) -> io::Result<()> {
        let Some(channel) = self.channel.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed",
            ));
        };

        let mut stalled_since: Option<Instant> = None;
        while !data.is_empty() {
            match channel.send(data, more) {
                Ok(0) => {
                    let err = io::Error::new(io::ErrorKind::WriteZero, "send returned 0");
                    self.close_with_error("send error", &err);
                    return Err(err);
                }
                Ok(n) => {
                    data = &data[n..];
                    stalled_since = None;
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    let since = *stalled_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= SEND_STALL_TIMEOUT {
                        self.close(reason::SEND_TIMEOUT);
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            reason::SEND_TIMEOUT,
                        ));
                    }
                    std::hint::spin_loop();
                }
                Err(e) => {
                    self.close_with_error("send error", &e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Close the connection with the generic `user close` reason.
    pub fn shutdown(&mut self) {
        self.close(reason::USER_CLOSE);
    }

    /// Close the connection. The first recorded reason wins.
    pub fn close(&mut self, why: &str) {
        if self.channel.take().is_some() {
            self.last_error.clear();
            self.last_error.push_str(why);
        }
    }

    pub(crate) fn close_with_error(&mut self, what: &str, err: &io::Error) {
        if self.channel.take().is_some() {
            self.last_error.clear();
            let _ = write!(self.last_error, "{what}: {err}");
        }
    }

    pub(crate) fn channel_mut(&mut self) -> Option<&mut C> {
        self.channel.as_mut()
    }
}
