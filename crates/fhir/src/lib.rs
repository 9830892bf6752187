//! FHIR wire/boundary support for Patient Consent Management.
//!
//! This crate provides **wire models** and **format/translation helpers** for the FHIR
//! resources published to a health information exchange:
//! - `Patient` (consent subject)
//! - `Contract` (the consent itself, with contained patient and provider resources)
//!
//! This crate focuses on:
//! - FHIR (DSTU2) JSON serialisation/deserialisation
//! - translation between flat domain carriers and nested wire structs
//! - strict parsing that reports the failing field path
//!
//! Transport (publishing to an exchange) lives in `pcm-core`.

pub mod contract;
pub mod patient;
mod wire;

// Re-export facades
pub use contract::Contract;
pub use patient::Patient;

// Re-export public domain-level types
pub use contract::{ActorKind, ActorRole, ContractActor, ContractData, ContractSignature};
pub use patient::{AdministrativeGender, PatientData};

/// A code from a FHIR code system.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialize JSON text, surfacing the path of the first failing field.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    json_text: &str,
    what: &str,
) -> FhirResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(FhirError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}

pub(crate) fn render_json<T: serde::Serialize>(value: &T, what: &str) -> FhirResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| FhirError::Translation(format!("Failed to serialise {what}: {e}")))
}
