//! Fhirtab Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the fhirtab pipeline crates.
//!
//! # Overview
//!
//! This crate provides functionality used across all fhirtab workspace members:
//!
//! - **Queues**: Bounded stage channels with sentinel-terminated streams
//! - **Types**: Flattened row and record batch shapes passed between stages
//! - **Logging**: `tracing` setup with console/file output and text/JSON format
//!
//! # Example
//!
//! ```no_run
//! use fhirtab_common::logging::{init_logging, LogConfig};
//!
//! fn start() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("pipeline starting");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod queue;
pub mod types;

// Re-export commonly used types
pub use queue::{
    channel, Message, QueueClosed, QueueReceiver, QueueSender, DEFAULT_QUEUE_CAPACITY,
};
pub use types::{column_union, FlattenedRow, RecordBatch};
