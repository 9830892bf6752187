//! Transfer objects exchanged between services and the web layer.

use crate::domain::{
    ConsentStage, IndividualProvider, OrganizationalProvider, Patient,
};
use crate::{PcmError, PcmResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Editable consent terms as submitted by a patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDto {
    /// Present when updating an existing consent.
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
    pub providers_permitted_to_disclose: BTreeSet<String>,
    #[serde(default)]
    pub organizational_providers_permitted_to_disclose: BTreeSet<String>,
    #[serde(default)]
    pub providers_disclosure_is_made_to: BTreeSet<String>,
    #[serde(default)]
    pub organizational_providers_disclosure_is_made_to: BTreeSet<String>,
    #[serde(default)]
    pub do_not_share_clinical_document_type_codes: BTreeSet<String>,
    #[serde(default)]
    pub do_not_share_clinical_document_section_type_codes: BTreeSet<String>,
    #[serde(default)]
    pub do_not_share_sensitivity_policy_codes: BTreeSet<String>,
    #[serde(default)]
    pub share_for_purpose_of_use_codes: BTreeSet<String>,
}

impl ConsentDto {
    pub fn disclosing_npis(&self) -> BTreeSet<String> {
        self.providers_permitted_to_disclose
            .union(&self.organizational_providers_permitted_to_disclose)
            .cloned()
            .collect()
    }

    pub fn recipient_npis(&self) -> BTreeSet<String> {
        self.providers_disclosure_is_made_to
            .union(&self.organizational_providers_disclosure_is_made_to)
            .cloned()
            .collect()
    }
}

/// One row of a patient's consent list, with every code and provider resolved to a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentListDto {
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
    pub stage: ConsentStage,
    pub revocation_type: Option<String>,
}

/// A consent document ready for download or signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPdfDto {
    pub id: u64,
    pub patient_id: u64,
    pub consent_name: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// A revocation request or the revocation document of a consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRevokationPdfDto {
    pub consent_id: u64,
    pub patient_id: u64,
    /// `EMERGENCY ONLY` or `NO NEVER`; other values are carried but never stamped.
    pub revocation_type: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<u8>>,
}

/// Resolved patient identity used by exports, FHIR mapping and document generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDto {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enterprise_identifier: Option<String>,
    pub medical_record_number: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub individual_providers: Vec<IndividualProvider>,
    pub organizational_providers: Vec<OrganizationalProvider>,
}

impl PatientDto {
    /// `Last, First`.
    pub fn name_last_first(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Display name of a provider on the patient's list; falls back to the NPI.
    pub fn provider_name(&self, npi: &str) -> String {
        if let Some(p) = self.individual_providers.iter().find(|p| p.npi == npi) {
            return p.display_name();
        }
        if let Some(o) = self.organizational_providers.iter().find(|o| o.npi == npi) {
            return o.org_name.clone();
        }
        npi.to_string()
    }
}

impl TryFrom<Patient> for PatientDto {
    type Error = PcmError;

    fn try_from(p: Patient) -> PcmResult<Self> {
        let id = p
            .id
            .ok_or_else(|| PcmError::InvalidInput("patient has not been saved".into()))?;
        Ok(Self {
            id,
            username: p.username,
            first_name: p.first_name,
            last_name: p.last_name,
            email: p.email,
            enterprise_identifier: p.enterprise_identifier,
            medical_record_number: p.medical_record_number,
            birth_date: p.birth_date,
            gender: p.gender,
            individual_providers: p.individual_providers,
            organizational_providers: p.organizational_providers,
        })
    }
}

/// Result of [`save_consent`](crate::services::ConsentService::save_consent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Box<crate::domain::Consent>),
    /// An existing consent with this id already covers the same providers and dates.
    Conflict(u64),
}


#[cfg(test)]
mod tests {
    use super::fixtures::patient_dto;

    #[test]
    fn provider_names_resolve_from_patient_list() {
        let p = patient_dto(1);
        assert_eq!(p.provider_name("1174858088"), "Smith, Jane");
        assert_eq!(p.provider_name("1083949036"), "Valley Health Clinic");
        assert_eq!(p.provider_name("0000000000"), "0000000000");
        assert_eq!(p.name_last_first(), "Doe, John");
    }
}
