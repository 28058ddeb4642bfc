//! Configuration parsing for the Ventas Nacionales service.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides (a `.env` file is loaded by `main`)
//! - Defaults matching the queue contract (5 messages, 10s wait, 5s delay)

use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::queue::drain::DrainConfig;

/// Ventas Nacionales: national sales API with a queue drain loop.
#[derive(Parser, Debug, Clone)]
#[command(name = "ventas-nacionales")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "VENTAS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "VENTAS_DB_PATH", default_value = "ventasnacionales.db")]
    pub db_path: PathBuf,

    /// Size of the SQLite connection pool
    #[arg(long, env = "VENTAS_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,

    /// AWS region of the sales queue
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// URL of the sales queue; the drain loop is disabled when unset
    #[arg(long, env = "SQS_QUEUE_URL")]
    pub queue_url: Option<String>,

    /// Maximum number of messages fetched per drain cycle
    #[arg(long, env = "VENTAS_MAX_MESSAGES", default_value_t = 5,
          value_parser = clap::value_parser!(i32).range(1..=10))]
    pub max_messages: i32,

    /// Long-poll wait for each receive, in seconds
    #[arg(long, env = "VENTAS_WAIT_TIME_SECS", default_value_t = 10,
          value_parser = clap::value_parser!(i32).range(0..=20))]
    pub wait_time_secs: i32,

    /// Delay between the end of one drain cycle and the start of the next, in seconds
    #[arg(long, env = "VENTAS_POLL_DELAY_SECS", default_value_t = 5)]
    pub poll_delay_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Drain loop settings derived from this configuration.
    pub fn drain_config(&self) -> DrainConfig {
        DrainConfig {
            max_messages: self.max_messages,
            wait_time_secs: self.wait_time_secs,
            poll_delay: Duration::from_secs(self.poll_delay_secs),
        }
    }
}

/// Load environment variables from a dotenv file.
///
/// Returns `Ok(false)` when the file does not exist. Variables already set
/// in the environment are not overridden.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: PathBuf::from("ventasnacionales.db"),
            pool_size: 8,
            aws_region: None,
            queue_url: None,
            max_messages: 5,
            wait_time_secs: 10,
            poll_delay_secs: 5,
            log_level: "info".into(),
        }
    }
}
