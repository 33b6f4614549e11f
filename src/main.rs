//! pollshell: demo admin shell server
//!
//! Serves the example command set in `shell.rs` from a single polling
//! thread until a client issues `stop` or the process receives SIGINT.

mod shell;

use pollshell::{Config, Server};
use shell::{AdminShell, ShellSession};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        idle_timeout_ms = config.idle_timeout_ms,
        poll_interval_us = config.poll_interval_us,
        version = pollshell::VERSION,
        "Starting pollshell"
    );

    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe {
        libc::signal(
            libc::SIGINT,
            on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }

    let mut server: Server<ShellSession> = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Admin server init failed");
            return Err(e.into());
        }
    };
    let mut shell = AdminShell::new(config.password.clone());
    let interval = config.poll_interval();

    info!("Server running");
    while !INTERRUPTED.load(Ordering::Relaxed) && !shell.stop_requested() {
        server.poll(&mut shell);
        if interval.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(interval);
        }
    }

    server.shutdown(&mut shell);
    info!("Server stopped");
    Ok(())
}
