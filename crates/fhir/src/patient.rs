//! FHIR Patient wire model and translation helpers.
//!
//! Responsibilities:
//! - Define the flat domain-level carrier used by services
//! - Translate to and from the nested DSTU2 wire structure
//! - Validate the resource type and enforce strict keys on parse

use crate::wire::{ContactPointWire, HumanNameWire, IdentifierWire, PatientWire, ResourceWire};
use crate::{parse_json, render_json, FhirError, FhirResult};
use chrono::NaiveDate;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Administrative gender as published to the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    pub(crate) fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    pub(crate) fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }

    /// Map an HL7 v3 administrative gender code (`M`, `F`, `UN`).
    pub fn from_v3_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" => AdministrativeGender::Male,
            "F" => AdministrativeGender::Female,
            "UN" => AdministrativeGender::Other,
            _ => AdministrativeGender::Unknown,
        }
    }
}

/// Domain-level carrier for a consent subject (flat structure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    pub id: String,

    /// Identifier system for the medical record number (e.g. `urn:oid:2.16.840.1.113883.3.467`).
    pub identifier_system: String,

    pub medical_record_number: String,

    pub family: String,

    pub given: Vec<String>,

    pub email: Option<String>,

    pub gender: Option<AdministrativeGender>,

    pub birth_date: Option<NaiveDate>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// Zero-sized namespace; all methods are associated functions.
pub struct Patient;

impl Patient {
    /// Parse a Patient resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the wire schema (the message names the failing path),
    /// - the resource is not a `Patient`,
    /// - the patient has no identifier or an unparseable birth date.
    pub fn parse(json_text: &str) -> FhirResult<PatientData> {
        match parse_json::<ResourceWire>(json_text, "Patient")? {
            ResourceWire::Patient(wire) => wire_to_domain(wire),
            other => Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Patient', got '{}'",
                other.type_name()
            ))),
        }
    }

    /// Render a Patient resource as JSON text.
    pub fn render(data: &PatientData) -> FhirResult<String> {
        render_json(&ResourceWire::Patient(domain_to_wire(data)), "patient")
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

pub(crate) fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        id: data.id.clone(),
        identifier: vec![IdentifierWire {
            system: data.identifier_system.clone(),
            value: data.medical_record_number.clone(),
        }],
        active: Some(true),
        name: vec![HumanNameWire {
            use_type: Some("official".into()),
            family: vec![data.family.clone()],
            given: data.given.clone(),
        }],
        telecom: data
            .email
            .iter()
            .map(|email| ContactPointWire {
                system: "email".into(),
                value: email.clone(),
                use_type: Some("home".into()),
            })
            .collect(),
        gender: data.gender.map(|g| g.to_wire().to_string()),
        birth_date: data.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

pub(crate) fn wire_to_domain(wire: PatientWire) -> FhirResult<PatientData> {
    let identifier = wire.identifier.into_iter().next().ok_or_else(|| {
        FhirError::InvalidInput(format!("Patient {} has no identifier", wire.id))
    })?;

    let name = wire.name.into_iter().next();
    let family = name
        .as_ref()
        .map(|n| n.family.join(" "))
        .unwrap_or_default();
    let given = name.map(|n| n.given).unwrap_or_default();

    let email = wire
        .telecom
        .into_iter()
        .find(|t| t.system == "email")
        .map(|t| t.value);

    let gender = wire.gender.as_deref().and_then(AdministrativeGender::from_wire);

    let birth_date = wire
        .birth_date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| FhirError::Translation(format!("Invalid birthDate: {e}")))?;

    Ok(PatientData {
        id: wire.id,
        identifier_system: identifier.system,
        medical_record_number: identifier.value,
        family,
        given,
        email,
        gender,
        birth_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatientData {
        PatientData {
            id: "patient".into(),
            identifier_system: "urn:oid:2.16.840.1.113883.3.467".into(),
            medical_record_number: "MRN-1".into(),
            family: "Doe".into(),
            given: vec!["John".into()],
            email: Some("john.doe@example.com".into()),
            gender: Some(AdministrativeGender::Male),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 17),
        }
    }

    #[test]
    fn renders_dstu2_shape() {
        let json = Patient::render(&sample()).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["resourceType"], "Patient");
        assert_eq!(value["identifier"][0]["value"], "MRN-1");
        assert_eq!(value["name"][0]["family"][0], "Doe");
        assert_eq!(value["name"][0]["given"][0], "John");
        assert_eq!(value["telecom"][0]["system"], "email");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["birthDate"], "1980-05-17");
    }

    #[test]
    fn parse_recovers_rendered_patient() {
        let json = Patient::render(&sample()).expect("render");
        assert_eq!(Patient::parse(&json).expect("parse"), sample());
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = r#"{
            "resourceType": "Patient",
            "id": "p1",
            "identifier": [{"system": "urn:oid:1.2.3", "value": "MRN-1"}],
            "maritalStatus": "M"
        }"#;

        let err = Patient::parse(input).expect_err("should reject unknown key");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("maritalStatus")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_other_resource_types() {
        let input = r#"{"resourceType": "Organization", "id": "o1", "name": "Clinic"}"#;

        let err = Patient::parse(input).expect_err("should reject Organization");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Organization"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn requires_identifier() {
        let input = r#"{"resourceType": "Patient", "id": "p1"}"#;
        assert!(matches!(
            Patient::parse(input),
            Err(FhirError::InvalidInput(_))
        ));
    }

    #[test]
    fn maps_v3_gender_codes() {
        assert_eq!(AdministrativeGender::from_v3_code("m"), AdministrativeGender::Male);
        assert_eq!(AdministrativeGender::from_v3_code("F"), AdministrativeGender::Female);
        assert_eq!(AdministrativeGender::from_v3_code("UN"), AdministrativeGender::Other);
        assert_eq!(AdministrativeGender::from_v3_code("?"), AdministrativeGender::Unknown);
    }
}
