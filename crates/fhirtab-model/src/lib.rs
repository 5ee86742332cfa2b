//! Fhirtab Model Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! FHIR bundle and resource parsing for the fhirtab pipeline.
//!
//! # Overview
//!
//! - **Bundle**: typed envelope over raw bundle JSON
//! - **Resource**: one parsed entry with its discriminant lifted out
//! - **Registry**: pluggable per-type parsers with a Synthea default set
//!
//! Entry resources are kept as ordered JSON maps rather than full FHIR
//! structure definitions; the pipeline flattens whatever fields are
//! present, so a schema per resource type would buy nothing here.

pub mod bundle;
pub mod error;
pub mod registry;
pub mod resource;

// Re-export commonly used types
pub use bundle::{Bundle, BundleEntry, BundleRequest};
pub use error::ModelError;
pub use registry::{EnvelopeParser, ModelRegistry, ResourceParser, DEFAULT_RESOURCE_TYPES};
pub use resource::{resource_type_of, Resource};
