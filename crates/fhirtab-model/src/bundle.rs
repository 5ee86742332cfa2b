//! FHIR Bundle envelope.
//!
//! Only the envelope is typed. Entry resources stay as raw JSON values so
//! the registry can decide per entry whether a model exists for them.

use crate::error::{ModelError, Result};
use crate::resource::resource_type_of;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A FHIR Bundle as read from a source file or URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Bundle kind, e.g. "transaction" or "collection".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    /// Absent entirely in some exports; an absent list is not the same as
    /// an empty one and callers treat it as an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<BundleEntry>>,
}

/// One entry in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleRequest>,
}

/// Transaction instruction attached to an entry. Carried through parsing
/// but not executed; loading is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Bundle {
    /// Parse a bundle from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Parse a bundle from an already-decoded JSON value.
    ///
    /// A document whose `resourceType` is anything but `"Bundle"` is
    /// rejected, so a stray Patient file cannot slip through as a bundle.
    pub fn from_value(value: Value) -> Result<Self> {
        match resource_type_of(&value)? {
            "Bundle" => {}
            other => {
                return Err(ModelError::NotABundle {
                    found: other.to_string(),
                })
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The entry list, if the bundle has one.
    pub fn entries(&self) -> Option<&[BundleEntry]> {
        self.entry.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient_bundle_json() -> String {
        json!({
            "resourceType": "Bundle",
            "id": "bundle-1",
            "type": "transaction",
            "entry": [{
                "fullUrl": "urn:uuid:1",
                "resource": {
                    "resourceType": "Patient",
                    "id": "1",
                    "name": [{"family": "Doe", "given": ["John"]}],
                    "gender": "male",
                    "birthDate": "1980-01-01"
                },
                "request": {"method": "POST", "url": "Patient"}
            }]
        })
        .to_string()
    }

    #[test]
    fn test_from_json_parses_transaction_bundle() {
        let bundle = Bundle::from_json(&patient_bundle_json()).unwrap();
        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.id.as_deref(), Some("bundle-1"));
        assert_eq!(bundle.bundle_type.as_deref(), Some("transaction"));

        let entries = bundle.entries().unwrap();
        assert_eq!(entries.len(), 1);
        let resource = entries[0].resource.as_ref().unwrap();
        assert_eq!(resource["resourceType"], "Patient");
        assert_eq!(
            entries[0].request.as_ref().unwrap().method.as_deref(),
            Some("POST")
        );
    }

    #[test]
    fn test_from_json_rejects_non_bundle() {
        let raw = json!({"resourceType": "Patient", "id": "1"}).to_string();
        match Bundle::from_json(&raw) {
            Err(ModelError::NotABundle { found }) => assert_eq!(found, "Patient"),
            other => panic!("expected NotABundle, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_missing_discriminant() {
        let raw = json!({"id": "1", "entry": []}).to_string();
        assert!(matches!(
            Bundle::from_json(&raw),
            Err(ModelError::MissingResourceType)
        ));
    }

    #[test]
    fn test_from_json_invalid_text() {
        assert!(matches!(
            Bundle::from_json("{not json"),
            Err(ModelError::Json(_))
        ));
    }

    #[test]
    fn test_absent_entry_list_is_none() {
        let raw = json!({"resourceType": "Bundle"}).to_string();
        let bundle = Bundle::from_json(&raw).unwrap();
        assert!(bundle.entries().is_none());
    }

    #[test]
    fn test_empty_entry_list_is_empty_slice() {
        let raw = json!({"resourceType": "Bundle", "entry": []}).to_string();
        let bundle = Bundle::from_json(&raw).unwrap();
        assert_eq!(bundle.entries().unwrap().len(), 0);
    }
}
