//! Error types for FHIR model parsing

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while interpreting raw FHIR JSON.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a Bundle, got resourceType {found:?}")]
    NotABundle { found: String },

    #[error("resource is missing the resourceType discriminant")]
    MissingResourceType,

    #[error("resourceType must be a string, got {found}")]
    NonStringResourceType { found: String },

    #[error("{resource_type} resource is not a JSON object")]
    NotAnObject { resource_type: String },

    #[error("no model registered for resource type {resource_type:?}")]
    UnknownResourceType { resource_type: String },

    #[error("parser for {expected} received a {found} resource")]
    TypeMismatch { expected: String, found: String },
}
