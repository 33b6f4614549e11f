//! Demo admin shell served by the `pollshell` binary.
//!
//! ```text
//! help              this text
//! login <password>  unlock the other commands
//! echo <str>        reply with <str>
//! time              server local time
//! uptime            server and session uptime
//! stop              stop the server
//! quit              close this connection
//! ```

use chrono::{DateTime, Local};
use pollshell::{Args, Channel, Connection, Handler};
use std::time::Instant;
use tracing::info;

const HELP: &str = "Server help:\n\
                    login password\n\
                    echo str\n\
                    time\n\
                    uptime\n\
                    stop\n\
                    quit\n";

/// Per-connection shell state.
#[derive(Debug)]
pub struct ShellSession {
    pub login: bool,
    pub since: DateTime<Local>,
}

impl Default for ShellSession {
    fn default() -> Self {
        Self {
            login: false,
            since: Local::now(),
        }
    }
}

pub struct AdminShell {
    password: String,
    started: Instant,
    stop_requested: bool,
}

impl AdminShell {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            started: Instant::now(),
            stop_requested: false,
        }
    }

    /// Whether a logged-in client issued `stop`.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

impl<C: Channel> Handler<C> for AdminShell {
    type Data = ShellSession;

    fn on_connect(&mut self, conn: &mut Connection<ShellSession, C>) {
        info!(peer = ?conn.peer_addr(), "Admin connection");
        let _ = conn.write(HELP.as_bytes(), false);
    }

    fn on_command(&mut self, conn: &mut Connection<ShellSession, C>, args: &Args<'_>) {
        let reply: String = match args.command() {
            b"help" => HELP.to_string(),
            b"login" => {
                if args.str(1) == Some(self.password.as_str()) {
                    conn.data.login = true;
                    "login success\n".to_string()
                } else {
                    "wrong password\n".to_string()
                }
            }
            _ if !conn.data.login => "must login first\n".to_string(),
            b"echo" => {
                if let Some(text) = args.get(1) {
                    let _ = conn.write(text, true);
                    "\n".to_string()
                } else {
                    String::new()
                }
            }
            b"time" => format!("{}\n", Local::now().format("%Y-%m-%d %H:%M:%S%.3f")),
            b"uptime" => format!(
                "server up {}s, session since {}\n",
                self.started.elapsed().as_secs(),
                conn.data.since.format("%Y-%m-%d %H:%M:%S")
            ),
            b"stop" => {
                info!(peer = ?conn.peer_addr(), "Stop requested");
                self.stop_requested = true;
                "stopping\n".to_string()
            }
            b"quit" => {
                conn.close("user quit");
                String::new()
            }
            _ => "invalid cmd, check help\n".to_string(),
        };

        if !reply.is_empty() {
            let _ = conn.write(reply.as_bytes(), false);
        }
    }

    fn on_disconnect(&mut self, conn: &mut Connection<ShellSession, C>, reason: &str) {
        info!(
            peer = ?conn.peer_addr(),
            reason,
            login = conn.data.login,
            "Admin disconnect"
        );
    }
}
