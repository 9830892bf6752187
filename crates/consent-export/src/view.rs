//! Flattened, render-ready view of a consent.

use crate::{ExportError, ExportResult};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientView {
    pub medical_record_number: String,
    pub enterprise_identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    /// Administrative gender code (`M`, `F`, `UN`).
    pub gender_code: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Individual,
    Organization,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderView {
    pub npi: String,
    pub name: String,
    pub kind: ProviderKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeView {
    pub code: String,
    pub code_system: String,
    pub display_name: String,
}

/// Everything the renderers need, with identifiers and display names already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentExportView {
    pub policy_id: String,
    /// OID of the assigning authority for the patient's medical record number.
    pub policy_domain_id: String,
    pub consent_name: String,
    pub patient: PatientView,
    pub disclosing_providers: Vec<ProviderView>,
    pub recipient_providers: Vec<ProviderView>,
    pub purposes_of_use: Vec<CodeView>,
    pub do_not_share_sensitivity_policies: Vec<CodeView>,
    pub do_not_share_document_types: Vec<CodeView>,
    pub do_not_share_document_sections: Vec<CodeView>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl ConsentExportView {
    /// Check the structural requirements shared by every export format.
    pub fn validate(&self) -> ExportResult<()> {
        if self.disclosing_providers.is_empty() {
            return Err(ExportError::NoDisclosingProvider);
        }
        if self.recipient_providers.is_empty() {
            return Err(ExportError::NoRecipientProvider);
        }
        if self.purposes_of_use.is_empty() {
            return Err(ExportError::NoPurposeOfUse);
        }
        if self.end_date < self.start_date {
            return Err(ExportError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Patient identifier in HL7 CX form, as used for XDS resource matching.
    pub fn patient_cx_id(&self) -> String {
        format!(
            "{}^^^&{}&ISO",
            self.patient.medical_record_number, self.policy_domain_id
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_view;
    use super::*;

    #[test]
    fn validate_accepts_complete_view() {
        assert!(sample_view().validate().is_ok());
    }

    #[test]
    fn validate_requires_both_provider_sides() {
        let mut view = sample_view();
        view.recipient_providers.clear();
        assert!(matches!(view.validate(), Err(ExportError::NoRecipientProvider)));

        let mut view = sample_view();
        view.disclosing_providers.clear();
        assert!(matches!(view.validate(), Err(ExportError::NoDisclosingProvider)));
    }

    #[test]
    fn validate_rejects_inverted_dates() {
        let mut view = sample_view();
        view.end_date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(matches!(
            view.validate(),
            Err(ExportError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn patient_cx_id_uses_domain_oid() {
        assert_eq!(
            sample_view().patient_cx_id(),
            "MRN-1^^^&2.16.840.1.113883.3.467&ISO"
        );
    }
}
