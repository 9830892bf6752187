//! JSON bodies of the REST API.
//!
//! These mirror the service DTOs of `pcm-core` but carry OpenAPI schemas and keep the wire
//! format stable independently of the domain model. Binary documents travel base64 encoded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

// ----------------------------------------------------------------------------
// Patients
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub enterprise_identifier: Option<String>,
    pub medical_record_number: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// HL7 v3 administrative gender code.
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Individual,
    Organizational,
}

/// A provider to add to a patient's list.
///
/// Individuals need first and last names, organizations an `org_name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddProviderReq {
    pub kind: ProviderKind,
    pub npi: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderRes {
    pub npi: String,
    pub name: String,
    pub kind: ProviderKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enterprise_identifier: Option<String>,
    pub medical_record_number: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub providers: Vec<ProviderRes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

// ----------------------------------------------------------------------------
// Consents
// ----------------------------------------------------------------------------

/// Consent terms, submitted on save and returned on read. `id` is set when editing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentTerms {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub providers_permitted_to_disclose: Vec<String>,
    #[serde(default)]
    pub organizational_providers_permitted_to_disclose: Vec<String>,
    #[serde(default)]
    pub providers_disclosure_is_made_to: Vec<String>,
    #[serde(default)]
    pub organizational_providers_disclosure_is_made_to: Vec<String>,
    #[serde(default)]
    pub do_not_share_clinical_document_type_codes: Vec<String>,
    #[serde(default)]
    pub do_not_share_clinical_document_section_type_codes: Vec<String>,
    #[serde(default)]
    pub do_not_share_sensitivity_policy_codes: Vec<String>,
    #[serde(default)]
    pub share_for_purpose_of_use_codes: Vec<String>,
}

/// Result of saving a consent: the saved id, or the id of the consent it conflicts with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaveConsentRes {
    pub consent_id: Option<u64>,
    pub conflicting_consent_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentSummaryRes {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub disclosing_provider_names: Vec<String>,
    pub recipient_provider_names: Vec<String>,
    pub do_not_share_clinical_document_types: Vec<String>,
    pub do_not_share_clinical_document_section_types: Vec<String>,
    pub do_not_share_sensitivity_policies: Vec<String>,
    pub share_for_purposes_of_use: Vec<String>,
    /// `CONSENT_SAVED`, `CONSENT_SIGNED` or `REVOCATION_REVOKED`.
    pub stage: String,
    pub revocation_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListConsentsRes {
    pub consents: Vec<ConsentSummaryRes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentEntryRes {
    pub id: u64,
    pub patient_id: u64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub consent_reference_id: String,
    pub stage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentEntriesRes {
    pub consents: Vec<ConsentEntryRes>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountRes {
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageRes {
    pub consent_id: u64,
    pub stage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentPdfRes {
    pub consent_id: u64,
    pub patient_id: u64,
    pub consent_name: String,
    pub filename: String,
    pub content_base64: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevocationReq {
    /// `EMERGENCY ONLY` or `NO NEVER`; other values are ignored.
    #[serde(default)]
    pub revocation_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevocationPdfRes {
    pub consent_id: u64,
    pub patient_id: u64,
    pub revocation_type: Option<String>,
    pub content_base64: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SigningWidgetRes {
    pub consent_id: u64,
    pub document_key: String,
    pub javascript: String,
}

// ----------------------------------------------------------------------------
// Allergies and reference codes
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllergyReq {
    pub allergen: String,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    pub status_code: String,
    #[serde(default)]
    pub onset_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllergyRes {
    pub id: u64,
    pub patient_id: u64,
    pub allergen: String,
    pub reaction: Option<String>,
    pub severity: Option<String>,
    pub status_code: String,
    pub onset_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListAllergiesRes {
    pub allergies: Vec<AllergyRes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceCodeRes {
    pub code: String,
    pub code_system: String,
    pub code_system_name: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListReferenceCodesRes {
    pub kind: String,
    pub codes: Vec<ReferenceCodeRes>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_request_defaults_missing_sets() {
        let req: ConsentTerms = serde_json::from_str(
            r#"{"name":"Share","start_date":"2027-01-01","end_date":"2027-06-01"}"#,
        )
        .unwrap();
        assert_eq!(req.name, "Share");
        assert_eq!(req.start_date, NaiveDate::from_ymd_opt(2027, 1, 1));
        assert!(req.providers_disclosure_is_made_to.is_empty());
        assert!(req.id.is_none());
    }

    #[test]
    fn provider_kind_is_snake_case() {
        let req: AddProviderReq =
            serde_json::from_str(r#"{"kind":"organizational","npi":"1083949036","org_name":"Clinic"}"#)
                .unwrap();
        assert_eq!(req.kind, ProviderKind::Organizational);
        assert_eq!(req.org_name.as_deref(), Some("Clinic"));
    }
}
