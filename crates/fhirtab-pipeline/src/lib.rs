//! Fhirtab Pipeline Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! The transform and load stages of the fhirtab ETL pipeline, plus the
//! runner that wires them to ingestion.
//!
//! # Overview
//!
//! - **Transform**: flattens each bundle into one record batch
//! - **Schema**: tracks what the destination already has
//! - **Load**: appends batches to Postgres, migrating columns on the fly
//! - **Runner**: spawns the three stages over bounded queues and joins them
//!
//! # Example
//!
//! ```no_run
//! use fhirtab_ingest::{BundleReader, BundleSource};
//! use fhirtab_model::ModelRegistry;
//! use fhirtab_pipeline::{create_pool, run_pipeline, DbConfig, PipelineOptions, PostgresSink};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let pool = create_pool(&DbConfig::from_env()?).await?;
//!     let report = run_pipeline(
//!         BundleReader::new()?,
//!         BundleSource::LocalDir("./data".into()),
//!         ModelRegistry::with_defaults(),
//!         PostgresSink::new(pool),
//!         PipelineOptions::default(),
//!     )
//!     .await?;
//!     assert!(report.success());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod load;
pub mod runner;
pub mod schema;
pub mod sink;
pub mod transform;

// Re-export commonly used types
pub use db::{create_pool, DbConfig, DbError, PostgresSink};
pub use load::{LoadStage, LoadSummary, PRIMARY_KEY_COLUMN};
pub use runner::{run_pipeline, PipelineOptions, PipelineReport};
pub use schema::{SchemaDelta, TrackedSchema};
pub use sink::{MemorySink, RecordSink, SinkError, SinkOp};
pub use transform::{flatten_resource, TransformError, TransformStage, TransformSummary};
