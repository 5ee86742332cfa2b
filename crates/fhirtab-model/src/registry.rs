//! Resource parser registry.
//!
//! The transform stage resolves every bundle entry against this registry.
//! An entry whose type has no registered parser is skipped instead of
//! failing the bundle, so one vendor-specific resource cannot poison a
//! whole export.

use crate::error::{ModelError, Result};
use crate::resource::{resource_type_of, Resource};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Resource types registered by [`ModelRegistry::with_defaults`]. Covers
/// the types found in Synthea patient exports.
pub const DEFAULT_RESOURCE_TYPES: &[&str] = &[
    "AllergyIntolerance",
    "CarePlan",
    "CareTeam",
    "Claim",
    "Condition",
    "Coverage",
    "Device",
    "DiagnosticReport",
    "DocumentReference",
    "Encounter",
    "ExplanationOfBenefit",
    "ImagingStudy",
    "Immunization",
    "Location",
    "Medication",
    "MedicationAdministration",
    "MedicationRequest",
    "Observation",
    "Organization",
    "Patient",
    "Practitioner",
    "PractitionerRole",
    "Procedure",
    "Provenance",
    "SupplyDelivery",
];

/// Turns the raw JSON of one resource type into a [`Resource`].
pub trait ResourceParser: Send + Sync {
    /// The resource type this parser accepts.
    fn resource_type(&self) -> &str;

    /// Parse a raw value carrying this parser's resource type.
    fn parse(&self, raw: &Value) -> Result<Resource>;
}

/// Generic parser for any resource type: validates the discriminant and
/// keeps the body verbatim.
#[derive(Debug, Clone)]
pub struct EnvelopeParser {
    resource_type: String,
}

impl EnvelopeParser {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
        }
    }
}

impl ResourceParser for EnvelopeParser {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn parse(&self, raw: &Value) -> Result<Resource> {
        let Value::Object(body) = raw else {
            return Err(ModelError::NotAnObject {
                resource_type: self.resource_type.clone(),
            });
        };
        let found = resource_type_of(raw)?;
        if found != self.resource_type {
            return Err(ModelError::TypeMismatch {
                expected: self.resource_type.clone(),
                found: found.to_string(),
            });
        }

        let mut fields = body.clone();
        fields.remove("resourceType");
        Ok(Resource::new(self.resource_type.clone(), fields))
    }
}

/// Lookup table from resource type to parser.
#[derive(Default)]
pub struct ModelRegistry {
    parsers: HashMap<String, Arc<dyn ResourceParser>>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("parsers", &self.parsers.len())
            .finish()
    }
}

impl ModelRegistry {
    /// An empty registry. Nothing parses until parsers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with an [`EnvelopeParser`] for every type in
    /// [`DEFAULT_RESOURCE_TYPES`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for resource_type in DEFAULT_RESOURCE_TYPES {
            registry.register(EnvelopeParser::new(*resource_type));
        }
        registry
    }

    /// Register a parser, replacing any existing one for the same type.
    pub fn register(&mut self, parser: impl ResourceParser + 'static) {
        self.parsers
            .insert(parser.resource_type().to_string(), Arc::new(parser));
    }

    pub fn resolve(&self, resource_type: &str) -> Option<&Arc<dyn ResourceParser>> {
        self.parsers.get(resource_type)
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.parsers.contains_key(resource_type)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parse a raw entry resource with the parser registered for its type.
    pub fn parse(&self, raw: &Value) -> Result<Resource> {
        let resource_type = resource_type_of(raw)?;
        let parser = self
            .resolve(resource_type)
            .ok_or_else(|| ModelError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            })?;
        parser.parse(raw)
    }
}
