//! Queue drain loop.
//!
//! Each drain cycle:
//! 1. Receives up to `max_messages`, long-polling up to `wait_time_secs`
//! 2. For each message, in order: parse, insert, then delete from the queue
//! 3. Stops at the first failure; later messages stay on the queue
//!
//! The next cycle starts `poll_delay` after the previous one finished.
//! A message is deleted only once its row is committed, so a crash between
//! the two redelivers it and inserts the sale again. Rows carry no
//! idempotency key; duplicates on redelivery are expected.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use super::provider::{QueueError, QueueMessage, QueueProvider};
use crate::model::SalePayload;
use crate::storage::{SalesStore, StorageError};

/// Settings for the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    /// Maximum number of messages fetched per cycle
    pub max_messages: i32,
    /// Long-poll wait for a receive, in seconds
    pub wait_time_secs: i32,
    /// Delay after a cycle completes before the next one starts
    pub poll_delay: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_messages: 5,
            wait_time_secs: 10,
            poll_delay: Duration::from_secs(5),
        }
    }
}

/// Error that aborts the remainder of a drain cycle.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Malformed sale in message {message_id}: {source}")]
    Parse {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Background task moving sales from a queue into the store.
pub struct DrainLoop {
    queue: Arc<dyn QueueProvider>,
    store: SalesStore,
    config: DrainConfig,
}

impl DrainLoop {
    pub fn new(queue: Arc<dyn QueueProvider>, store: SalesStore, config: DrainConfig) -> Self {
        Self {
            queue,
            store,
            config,
        }
    }

    /// Run one fetch-and-process pass.
    ///
    /// Returns the number of sales registered.
    pub async fn drain_cycle(&self) -> Result<usize, DrainError> {
        let batch = self.receive().await?;
        self.process_batch(batch).await
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError> {
        self.queue
            .receive(self.config.max_messages, self.config.wait_time_secs)
            .await
    }

    async fn process_batch(&self, batch: Vec<QueueMessage>) -> Result<usize, DrainError> {
        if batch.is_empty() {
            tracing::debug!("No messages received");
            return Ok(0);
        }

        let mut registered = 0;
        for message in batch {
            let sale: SalePayload =
                serde_json::from_str(&message.body).map_err(|source| DrainError::Parse {
                    message_id: message.message_id.clone(),
                    source,
                })?;

            let id = self.store.insert(&sale)?;

            // Only a committed row releases the message.
            self.queue.delete(&message.receipt_handle).await?;

            tracing::info!(
                message_id = %message.message_id,
                id,
                modelo = %sale.modelo,
                precio = sale.precio,
                comprador = %sale.comprador,
                fecha = %sale.fecha,
                "Sale registered from queue"
            );
            registered += 1;
        }

        Ok(registered)
    }

    /// Drain until `shutdown_rx` turns true or its sender is dropped.
    ///
    /// Shutdown interrupts the long-poll wait and the post-cycle delay.
    /// A batch already being processed is finished first.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        tracing::info!(
            max_messages = self.config.max_messages,
            wait_time_secs = self.config.wait_time_secs,
            poll_delay_secs = self.config.poll_delay.as_secs(),
            "Drain loop started"
        );

        loop {
            let received = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
                received = self.receive() => received,
            };

            let outcome = match received {
                Ok(batch) => self.process_batch(batch).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Ok(0) => {}
                Ok(registered) => tracing::debug!(registered, "Drain cycle complete"),
                Err(e) => tracing::error!(error = %e, "Drain cycle failed"),
            }

            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
                _ = tokio::time::sleep(self.config.poll_delay) => {}
            }
        }

        tracing::info!("Drain loop stopped");
    }
}

async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    // A dropped sender also ends the loop.
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}
