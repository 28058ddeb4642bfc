//! SQLite storage layer for sale records.
//!
//! Provides:
//! - Schema initialization and connection pragmas
//! - The [`SalesStore`] gateway shared by the HTTP surface and the drain loop

pub mod sales;
pub mod schema;

pub use sales::{SalesStore, StorageError};
