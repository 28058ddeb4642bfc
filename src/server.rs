//! Process wiring and lifecycle.
//!
//! Opens the store once and hands clones to:
//! - the HTTP router
//! - the drain loop task (when a queue is configured)
//!
//! Both stop on the same shutdown signal.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::http::{create_router, AppState};
use crate::queue::{DrainConfig, DrainLoop, QueueProvider, SqsQueue};
use crate::storage::{SalesStore, StorageError};

/// Error type for server startup and shutdown.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Drain task failed: {0}")]
    DrainTask(#[from] tokio::task::JoinError),
}

/// Run the service until `shutdown_rx` turns true.
pub async fn run_server(
    config: Config,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let store = SalesStore::open(&config.db_path, config.pool_size)?;
    tracing::info!(path = %config.db_path.display(), "Sales store ready");

    let queue: Option<Arc<dyn QueueProvider>> = match &config.queue_url {
        Some(queue_url) => {
            let sqs = SqsQueue::connect(config.aws_region.clone(), queue_url.clone()).await;
            tracing::info!(queue_url = %sqs.queue_url(), "Draining sales queue");
            Some(Arc::new(sqs))
        }
        None => {
            tracing::warn!("SQS_QUEUE_URL not set; drain loop disabled");
            None
        }
    };

    let listener = TcpListener::bind(addr).await?;
    serve(listener, store, queue, config.drain_config(), shutdown_rx).await
}

/// Serve HTTP on `listener` and drain `queue` into `store`.
///
/// Returns after the HTTP server has stopped and the drain task has exited.
pub async fn serve(
    listener: TcpListener,
    store: SalesStore,
    queue: Option<Arc<dyn QueueProvider>>,
    drain_config: DrainConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let drain_task = queue.map(|queue| {
        let drain = DrainLoop::new(queue, store.clone(), drain_config);
        tokio::spawn(drain.run(shutdown_rx.clone()))
    });

    let app = create_router(Arc::new(AppState { store }));
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Starting HTTP server");

    let mut http_shutdown_rx = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = http_shutdown_rx.wait_for(|stop| *stop).await;
            tracing::info!("Shutdown signal received, stopping HTTP server");
        })
        .await?;

    if let Some(task) = drain_task {
        tracing::info!("Waiting for drain loop to stop");
        task.await?;
    }

    tracing::info!("Server stopped");
    Ok(())
}
