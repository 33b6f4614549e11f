//! Error types and connection close reasons.
//!
//! Only listener setup failures are reported as `Err` to the host. Everything
//! that goes wrong on an individual connection closes that connection and is
//! surfaced through `Handler::on_disconnect` as a reason string.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Listener setup failures. The server does not start when one of these is returned.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address could not be parsed.
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("socket error: {0}")]
    Socket(#[source] io::Error),

    #[error("setsockopt SO_REUSEADDR error: {0}")]
    ReuseAddr(#[source] io::Error),

    #[error("set O_NONBLOCK error: {0}")]
    NonBlocking(#[source] io::Error),

    #[error("bind error: {0}")]
    Bind(#[source] io::Error),

    #[error("listen error: {0}")]
    Listen(#[source] io::Error),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    FileRead { path: PathBuf, source: io::Error },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Fixed close reasons recorded by the engine.
pub mod reason {
    /// Peer performed an orderly shutdown.
    pub const REMOTE_CLOSE: &str = "remote close";
    /// A command grew to the receive buffer capacity without a terminator.
    pub const RECV_BUF_FULL: &str = "recv buf full";
    /// No data arrived within the inactivity deadline.
    pub const TIMEOUT: &str = "timeout";
    /// Host close through `Connection::shutdown`.
    pub const USER_CLOSE: &str = "user close";
    /// The peer stopped draining its socket while we were writing.
    pub const SEND_TIMEOUT: &str = "send timeout";
    /// The server was dropped with the connection still open.
    pub const SHUTDOWN: &str = "shutdown";
}
