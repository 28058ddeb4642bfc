//! Ventas Nacionales: national sales API with a queue drain loop.
//!
//! # Usage
//!
//! ```bash
//! ventas-nacionales --port 3000 --db-path ./ventasnacionales.db
//! ```
//!
//! Environment variables can also be used (a `.env` file is honoured):
//! - `PORT`: Port to listen on
//! - `VENTAS_DB_PATH`: SQLite database file
//! - `AWS_REGION`: Region of the sales queue
//! - `SQS_QUEUE_URL`: Sales queue; the drain loop only runs when set
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use std::path::Path;
use tokio::sync::watch;
use ventas::config::{load_env_file, Config};
use ventas::observability::tracing::init_tracing;
use ventas::server::run_server;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Ventas Nacionales v{}

  Configuration:
    Address:    {}:{}
    Database:   {}
    Queue:      {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.db_path.display(),
        config.queue_url.as_deref().unwrap_or("(disabled)"),
        config.log_level
    );
}

/// Resolve when SIGINT (or SIGTERM on unix) arrives.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(Path::new(".env"));

    let config = Config::parse_args();
    init_tracing(&config.log_level);
    match env_file {
        Ok(true) => tracing::debug!("Loaded .env"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring malformed .env file"),
    }
    print_banner(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            // Dropping the sender would stop the server, so keep it alive.
            tracing::error!(error = %e, "Failed to listen for shutdown signals");
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(true);
    });

    run_server(config, shutdown_rx)
        .await
        .context("ventas-nacionales server failed")?;

    tracing::info!("Ventas Nacionales shutdown complete");
    Ok(())
}
