//! Amazon SQS queue provider.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;

use super::provider::{QueueError, QueueMessage, QueueProvider};

/// A [`QueueProvider`] backed by one SQS queue.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Build a client from the default AWS credential chain.
    ///
    /// `region` overrides the region the chain would resolve.
    pub async fn connect(region: Option<String>, queue_url: impl Into<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self::new(Client::new(&sdk_config), queue_url)
    }

    /// Wrap an already configured client.
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// The queue this provider drains.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

// A delivery without a receipt handle cannot be deleted; it is skipped.
fn to_queue_messages(messages: &[Message]) -> Vec<QueueMessage> {
    messages
        .iter()
        .filter_map(|message| {
            let message_id = message.message_id().unwrap_or_default().to_string();
            let Some(receipt_handle) = message.receipt_handle() else {
                tracing::error!(%message_id, "Skipping message without receipt handle");
                return None;
            };
            Some(QueueMessage {
                message_id,
                receipt_handle: receipt_handle.to_string(),
                body: message.body().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl QueueProvider for SqsQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(e).to_string()))?;

        Ok(to_queue_messages(output.messages()))
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}
