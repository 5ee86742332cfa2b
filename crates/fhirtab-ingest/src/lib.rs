//! Fhirtab Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Reads FHIR bundles from local disk or HTTP and streams them into the
//! pipeline's bundle queue.
//!
//! # Overview
//!
//! Three source modes, mirroring where Synthea exports usually live:
//!
//! - **LocalDir**: every regular file in a directory
//! - **FileUrl**: a single bundle behind a URL
//! - **FolderUrl**: a public GitHub folder, fetched via its JSON listing
//!
//! A failure scoped to one file or URL is logged and counted; the run
//! carries on with the rest.

pub mod reader;
pub mod source;

// Re-export commonly used types
pub use reader::{BundleReader, IngestSummary, SourceError, DEFAULT_HTTP_TIMEOUT};
pub use source::BundleSource;
