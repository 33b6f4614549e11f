//! # pollshell
//!
//! An embeddable admin command server. A process links it in to expose a
//! line-oriented shell (login, diagnostics, control commands) over a plain
//! TCP socket, driven from the host's own loop by calling [`Server::poll`].
//!
//! ## Architecture
//!
//! ```text
//! Server::poll
//!     ├── ConnectionPool::try_accept   at most one new peer per call
//!     └── ConnectionPool::sweep        every live connection, in slot order
//!             ├── RecvBuffer::fill     one non-blocking read
//!             ├── Tokenizer::tokenize  split into commands -> Handler::on_command
//!             ├── RecvBuffer::consume  keep the partial command, compact
//!             └── timeout / close      Handler::on_disconnect, swap-remove
//! ```
//!
//! Nothing blocks and nothing allocates once the server is built: slots,
//! receive buffers and tokenizer scratch space are sized by the `CAP` and
//! `MAX_CONNS` const parameters up front.
//!
//! ## Example
//!
//! ```no_run
//! use pollshell::{Args, Config, Connection, Handler, Server, TcpChannel};
//!
//! #[derive(Default)]
//! struct Session {
//!     commands: u64,
//! }
//!
//! struct Shell;
//!
//! impl Handler<TcpChannel> for Shell {
//!     type Data = Session;
//!
//!     fn on_connect(&mut self, conn: &mut Connection<Session, TcpChannel>) {
//!         let _ = conn.write(b"hello\n", false);
//!     }
//!
//!     fn on_command(&mut self, conn: &mut Connection<Session, TcpChannel>, args: &Args<'_>) {
//!         conn.data.commands += 1;
//!         if args.command() == b"quit" {
//!             conn.close("user quit");
//!         }
//!     }
//!
//!     fn on_disconnect(&mut self, _conn: &mut Connection<Session, TcpChannel>, reason: &str) {
//!         println!("disconnected: {reason}");
//!     }
//! }
//!
//! let mut server: Server<Session> = Server::bind(&Config::default()).unwrap();
//! let mut shell = Shell;
//! loop {
//!     server.poll(&mut shell);
//!     std::thread::yield_now();
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod runtime;

pub use config::Config;
pub use error::{ConfigError, ServerError};
pub use protocol::{Args, Tokenizer};
pub use runtime::{
    Channel, Connection, Handler, Listener, Recv, Server, TcpAcceptor, TcpChannel,
};

/// Version of pollshell
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
