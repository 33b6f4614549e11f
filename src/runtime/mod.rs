//! Single-threaded, non-blocking connection runtime.
//!
//! - `channel`: byte channel and listener traits plus the TCP implementation
//! - `buffer`: per-connection receive buffer with compaction
//! - `connection`: host-facing connection handle
//! - `pool`: fixed connection slots with swap-removal
//! - `server`: the poll loop driving accept, read, dispatch and timeouts

mod buffer;
mod channel;
mod connection;
mod handler;
mod pool;
mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{BufferFull, RecvBuffer};
pub use channel::{Channel, Listener, Recv, TcpAcceptor, TcpChannel};
pub use connection::{Connection, SEND_STALL_TIMEOUT};
pub use handler::Handler;
pub use pool::ConnectionPool;
pub use server::{Server, DEFAULT_MAX_CMD_LEN, DEFAULT_MAX_CONNS};
