//! Queue side of the service.
//!
//! Provides:
//! - The [`QueueProvider`] seam (receive, delete)
//! - An Amazon SQS provider and an in-memory provider
//! - The [`DrainLoop`] that moves queued sales into storage

pub mod drain;
pub mod memory;
pub mod provider;
pub mod sqs;

pub use drain::{DrainConfig, DrainError, DrainLoop};
pub use memory::MemoryQueue;
pub use provider::{QueueError, QueueMessage, QueueProvider};
pub use sqs::SqsQueue;
