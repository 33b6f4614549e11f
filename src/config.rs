//! Configuration for the admin server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the admin server
#[derive(Parser, Debug)]
#[command(name = "pollshell")]
#[command(version)]
#[command(about = "A poll-driven TCP admin command shell", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:1234)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Close connections idle for this many milliseconds (0 = never)
    #[arg(short = 't', long)]
    pub idle_timeout_ms: Option<u64>,

    /// Listen backlog
    #[arg(long)]
    pub backlog: Option<i32>,

    /// Sleep between polls in microseconds (0 = just yield)
    #[arg(long)]
    pub poll_interval_us: Option<u64>,

    /// Password accepted by the `login` command
    #[arg(long)]
    pub password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Inactivity timeout in milliseconds, 0 disables it
    #[serde(default)]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_us: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            idle_timeout_ms: 0,
            backlog: default_backlog(),
            poll_interval_us: default_poll_interval(),
        }
    }
}

/// Demo shell configuration
#[derive(Debug, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            password: default_password(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:1234".to_string()
}

fn default_backlog() -> i32 {
    5
}

fn default_poll_interval() -> u64 {
    1000 // 1ms
}

fn default_password() -> String {
    "123456".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub idle_timeout_ms: u64,
    pub backlog: i32,
    pub poll_interval_us: u64,
    pub password: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::merge(None, TomlConfig::default())
    }
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents =
                std::fs::read_to_string(config_path).map_err(|source| ConfigError::FileRead {
                    path: config_path.clone(),
                    source,
                })?;
            toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                path: config_path.clone(),
                source,
            })?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(Some(cli), toml_config))
    }

    fn merge(cli: Option<CliArgs>, toml_config: TomlConfig) -> Self {
        let Some(cli) = cli else {
            return Config {
                listen: toml_config.server.listen,
                idle_timeout_ms: toml_config.server.idle_timeout_ms,
                backlog: toml_config.server.backlog,
                poll_interval_us: toml_config.server.poll_interval_us,
                password: toml_config.shell.password,
                log_level: toml_config.logging.level,
            };
        };

        Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            idle_timeout_ms: cli
                .idle_timeout_ms
                .unwrap_or(toml_config.server.idle_timeout_ms),
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            poll_interval_us: cli
                .poll_interval_us
                .unwrap_or(toml_config.server.poll_interval_us),
            password: cli.password.unwrap_or(toml_config.shell.password),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        }
    }

    /// Inactivity timeout; zero disables it.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}
