//! Observability infrastructure.
//!
//! Console logging only, through `tracing`.

pub mod tracing;
