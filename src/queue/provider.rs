//! The seam between the drain loop and a concrete queue service.

use async_trait::async_trait;
use thiserror::Error;

/// Error type for queue provider operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive messages: {0}")]
    Receive(String),

    #[error("Failed to delete message: {0}")]
    Delete(String),
}

/// One delivery of a queue message.
///
/// The same message delivered twice carries the same `message_id` but a
/// different `receipt_handle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

/// A remote at-least-once queue offering receive and delete.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Fetch up to `max_messages`, waiting up to `wait_time_secs` when
    /// none are immediately available. An empty batch is not an error.
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Delete the delivery identified by `receipt_handle`.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}
