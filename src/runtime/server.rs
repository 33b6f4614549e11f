//! The poll loop.
//!
//! `Server::poll` is the only entry point the host drives. Each call admits at
//! most one new connection and then services every live connection once. It
//! never blocks.

use super::channel::{Listener, TcpAcceptor};
use super::connection::Connection;
use super::handler::Handler;
use super::pool::ConnectionPool;
use crate::config::Config;
use crate::error::{reason, ServerError};
use crate::protocol::Tokenizer;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::info;

/// Default receive buffer capacity, which is also the maximum command length.
pub const DEFAULT_MAX_CMD_LEN: usize = 4096;

/// Default number of concurrent connections.
pub const DEFAULT_MAX_CONNS: usize = 10;

/// Admin command server.
///
/// - `D`: per-connection host state
/// - `L`: listener producing channels
/// - `CAP`: receive buffer bytes per connection (maximum command length)
/// - `MAX_CONNS`: connection slots
///
/// Must be driven from a single thread.
pub struct Server<
    D,
    L: Listener = TcpAcceptor,
    const CAP: usize = DEFAULT_MAX_CMD_LEN,
    const MAX_CONNS: usize = DEFAULT_MAX_CONNS,
> {
    listener: L,
    pool: ConnectionPool<D, L::Channel, CAP, MAX_CONNS>,
    tokenizer: Tokenizer,
    idle_timeout: Option<Duration>,
}

impl<D: Default, const CAP: usize, const MAX_CONNS: usize> Server<D, TcpAcceptor, CAP, MAX_CONNS> {
    /// Bind a TCP listener as described by `config`.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let listener = TcpAcceptor::from_config(config)?;
        let server = Self::with_listener(listener, config.idle_timeout());
        info!(
            addr = ?server.local_addr(),
            max_cmd_len = CAP,
            max_conns = MAX_CONNS,
            idle_timeout_ms = config.idle_timeout_ms,
            "Admin server listening"
        );
        Ok(server)
    }
}

impl<D: Default, L: Listener, const CAP: usize, const MAX_CONNS: usize>
    Server<D, L, CAP, MAX_CONNS>
{
    /// Serve connections from `listener`. A zero `idle_timeout` disables timeouts.
    pub fn with_listener(listener: L, idle_timeout: Duration) -> Self {
        Self {
            listener,
            pool: ConnectionPool::new(),
            tokenizer: Tokenizer::new(CAP),
            idle_timeout: (!idle_timeout.is_zero()).then_some(idle_timeout),
        }
    }

    /// Run one poll cycle at the current time.
    pub fn poll<H>(&mut self, handler: &mut H)
    where
        H: Handler<L::Channel, Data = D>,
    {
        self.poll_at(handler, Instant::now());
    }

    /// Run one poll cycle: one accept attempt, then one sweep over all
    /// live connections.
    pub fn poll_at<H>(&mut self, handler: &mut H, now: Instant)
    where
        H: Handler<L::Channel, Data = D>,
    {
        let deadline = self.idle_timeout.map(|timeout| now + timeout);
        self.pool.try_accept(&mut self.listener, handler, deadline);
        self.pool
            .sweep(handler, &mut self.tokenizer, now, self.idle_timeout);
    }

    /// Close every connection, notifying `handler`.
    pub fn shutdown<H>(&mut self, handler: &mut H)
    where
        H: Handler<L::Channel, Data = D>,
    {
        self.pool.close_all(handler, reason::SHUTDOWN);
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Live connections in slot order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection<D, L::Channel>> {
        self.pool.iter()
    }

    pub fn connections_mut(&mut self) -> impl Iterator<Item = &mut Connection<D, L::Channel>> {
        self.pool.iter_mut()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn max_cmd_len(&self) -> usize {
        CAP
    }

    pub fn max_conns(&self) -> usize {
        MAX_CONNS
    }
}
