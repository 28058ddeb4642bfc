//! Ventas Nacionales: national sales records over HTTP, fed by a queue.
//!
//! Two independent writers share one SQLite table:
//!
//! - **HTTP surface**: CRUD endpoints under `/nacional/ventas`
//! - **Drain loop**: a background task that pulls sale messages from a
//!   remote queue and deletes each one only after its row is committed
//!
//! Delivery from the queue is At-Least-Once: a crash between insert and
//! delete redelivers the message and produces a duplicate row.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`http`]: axum router, handlers and error mapping
//! - [`model`]: sale record types shared by every writer
//! - [`observability`]: tracing setup
//! - [`queue`]: queue provider trait, SQS and in-memory providers, drain loop
//! - [`server`]: process wiring and lifecycle
//! - [`storage`]: SQLite persistence layer

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // queue::QueueError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod http;
pub mod model;
pub mod observability;
pub mod queue;
pub mod server;
pub mod storage;
