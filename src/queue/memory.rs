//! In-process queue provider.
//!
//! Models the delivery semantics the drain loop relies on:
//! - `receive` moves messages to in-flight with a fresh receipt handle
//! - `delete` removes one in-flight delivery
//! - undeleted deliveries return to the queue via
//!   [`MemoryQueue::redeliver_in_flight`] (visibility timeout expiry)

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

use super::provider::{QueueError, QueueMessage, QueueProvider};

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<StoredMessage>,
    /// Deliveries awaiting delete, in delivery order.
    in_flight: Vec<(String, StoredMessage)>,
    next_message: u64,
    next_delivery: u64,
    receive_calls: u64,
    fail_next_receive: Option<String>,
    fail_next_delete: Option<String>,
}

/// An in-memory at-least-once queue.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    arrivals: Notify,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a message body and return its message id.
    pub fn send(&self, body: impl Into<String>) -> String {
        let message_id = {
            let mut state = self.lock();
            state.next_message += 1;
            let message_id = format!("msg-{}", state.next_message);
            state.pending.push_back(StoredMessage {
                message_id: message_id.clone(),
                body: body.into(),
            });
            message_id
        };
        self.arrivals.notify_waiters();
        message_id
    }

    /// Return every undeleted delivery to the head of the queue.
    ///
    /// Returns the number of messages made visible again.
    pub fn redeliver_in_flight(&self) -> usize {
        let count = {
            let mut state = self.lock();
            let in_flight = std::mem::take(&mut state.in_flight);
            let count = in_flight.len();
            for (_, message) in in_flight.into_iter().rev() {
                state.pending.push_front(message);
            }
            count
        };
        if count > 0 {
            self.arrivals.notify_waiters();
        }
        count
    }

    /// Make the next `receive` call fail with the given reason.
    pub fn fail_next_receive(&self, reason: impl Into<String>) {
        self.lock().fail_next_receive = Some(reason.into());
    }

    /// Make the next `delete` call fail with the given reason.
    pub fn fail_next_delete(&self, reason: impl Into<String>) {
        self.lock().fail_next_delete = Some(reason.into());
    }

    /// Messages visible to the next `receive`.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Deliveries received but not yet deleted.
    pub fn in_flight_len(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Number of `receive` calls served so far, failed ones included.
    pub fn receive_calls(&self) -> u64 {
        self.lock().receive_calls
    }

    fn take_batch(&self, max_messages: usize) -> Vec<QueueMessage> {
        let mut state = self.lock();
        let take = max_messages.min(state.pending.len());
        let mut batch = Vec::with_capacity(take);

        for _ in 0..take {
            let Some(message) = state.pending.pop_front() else {
                break;
            };
            state.next_delivery += 1;
            let receipt_handle = format!("{}#{}", message.message_id, state.next_delivery);
            batch.push(QueueMessage {
                message_id: message.message_id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: message.body.clone(),
            });
            state.in_flight.push((receipt_handle, message));
        }

        batch
    }
}

#[async_trait]
impl QueueProvider for MemoryQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        {
            let mut state = self.lock();
            state.receive_calls += 1;
            if let Some(reason) = state.fail_next_receive.take() {
                return Err(QueueError::Receive(reason));
            }
        }

        let max_messages = usize::try_from(max_messages).unwrap_or(0);

        // Register interest before checking so a concurrent send is not missed.
        let arrival = self.arrivals.notified();
        let batch = self.take_batch(max_messages);
        if !batch.is_empty() || wait_time_secs <= 0 {
            return Ok(batch);
        }

        let wait = Duration::from_secs(u64::try_from(wait_time_secs).unwrap_or(0));
        let _ = tokio::time::timeout(wait, arrival).await;
        Ok(self.take_batch(max_messages))
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_next_delete.take() {
            return Err(QueueError::Delete(reason));
        }

        let position = state
            .in_flight
            .iter()
            .position(|(handle, _)| handle == receipt_handle)
            .ok_or_else(|| QueueError::Delete(format!("unknown receipt handle {receipt_handle}")))?;
        state.in_flight.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receive_respects_batch_limit() {
        let queue = MemoryQueue::new();
        for i in 0..7 {
            queue.send(format!("body-{i}"));
        }

        let batch = queue.receive(5, 0).await.unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].body, "body-0");
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(queue.in_flight_len(), 5);
    }

    #[tokio::test]
    async fn test_delete_removes_in_flight_delivery() {
        let queue = MemoryQueue::new();
        queue.send("hello");

        let batch = queue.receive(5, 0).await.unwrap();
        queue.delete(&batch[0].receipt_handle).await.unwrap();

        assert_eq!(queue.in_flight_len(), 0);
        assert_eq!(queue.redeliver_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_handle_fails() {
        let queue = MemoryQueue::new();
        let err = queue.delete("nope").await.unwrap_err();
        assert!(matches!(err, QueueError::Delete(_)));
    }

    #[tokio::test]
    async fn test_redelivery_keeps_message_id_with_new_handle() {
        let queue = MemoryQueue::new();
        let message_id = queue.send("hello");

        let first = queue.receive(5, 0).await.unwrap();
        assert_eq!(queue.redeliver_in_flight(), 1);
        let second = queue.receive(5, 0).await.unwrap();

        assert_eq!(first[0].message_id, message_id);
        assert_eq!(second[0].message_id, message_id);
        assert_ne!(first[0].receipt_handle, second[0].receipt_handle);
    }

    #[tokio::test]
    async fn test_injected_receive_failure_is_one_shot() {
        let queue = MemoryQueue::new();
        queue.send("hello");
        queue.fail_next_receive("throttled");

        assert!(matches!(
            queue.receive(5, 0).await,
            Err(QueueError::Receive(_))
        ));
        assert_eq!(queue.receive(5, 0).await.unwrap().len(), 1);
        assert_eq!(queue.receive_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_returns_empty_after_wait() {
        let queue = MemoryQueue::new();
        let start = tokio::time::Instant::now();

        let batch = queue.receive(5, 10).await.unwrap();

        assert!(batch.is_empty());
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_wakes_on_send() {
        let queue = std::sync::Arc::new(MemoryQueue::new());
        let sender = queue.clone();

        let receiver = tokio::spawn(async move { queue.receive(5, 10).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        sender.send("late");

        let batch = receiver.await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "late");
    }
}
