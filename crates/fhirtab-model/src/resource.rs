//! Parsed FHIR resources.

use crate::error::{ModelError, Result};
use serde_json::{Map, Value};

/// Read the `resourceType` discriminant from a raw JSON value.
pub fn resource_type_of(raw: &Value) -> Result<&str> {
    match raw.get("resourceType") {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ModelError::NonStringResourceType {
            found: other.to_string(),
        }),
        None => Err(ModelError::MissingResourceType),
    }
}

/// A single parsed FHIR resource.
///
/// The `resourceType` discriminant is lifted into its own field; the
/// remaining fields keep the order they had in the source document, which
/// later decides both row key order and destination column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    resource_type: String,
    fields: Map<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            fields,
        }
    }

    /// The FHIR resource type, e.g. `"Patient"`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The logical id, when the resource carries one as a plain string.
    pub fn id(&self) -> Option<&str> {
        match self.fields.get("id") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Body fields in source document order, discriminant excluded.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
