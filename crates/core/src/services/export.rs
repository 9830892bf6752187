//! Builds exportable views of a consent and renders its XACML and CDA R2 artifacts.

use crate::domain::{Consent, ReferenceKind};
use crate::services::dto::PatientDto;
use crate::PcmResult;
use consent_export::{
    cdar2, xacml, CodeView, ConsentExportView, PatientView, ProviderKind, ProviderView,
};
use std::collections::BTreeSet;

/// Every artifact produced for a saved consent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentArtifacts {
    pub xacml: String,
    pub xacml_pdf_consent_from: String,
    pub xacml_pdf_consent_to: String,
    pub cdar2: String,
}

#[derive(Clone, Debug)]
pub struct ConsentExportService {
    policy_domain_id: String,
}

impl ConsentExportService {
    pub fn new(policy_domain_id: impl Into<String>) -> Self {
        Self {
            policy_domain_id: policy_domain_id.into(),
        }
    }

    pub fn build_view(&self, consent: &Consent, patient: &PatientDto) -> ConsentExportView {
        ConsentExportView {
            policy_id: consent.consent_reference_id.clone(),
            policy_domain_id: self.policy_domain_id.clone(),
            consent_name: consent.name.clone(),
            patient: PatientView {
                medical_record_number: patient.medical_record_number.clone(),
                enterprise_identifier: patient.enterprise_identifier.clone().unwrap_or_default(),
                first_name: patient.first_name.clone(),
                last_name: patient.last_name.clone(),
                email: patient.email.clone(),
                birth_date: patient.birth_date,
                gender_code: patient.gender.clone(),
            },
            disclosing_providers: providers(
                patient,
                &consent.providers_permitted_to_disclose,
                &consent.organizational_providers_permitted_to_disclose,
            ),
            recipient_providers: providers(
                patient,
                &consent.providers_disclosure_is_made_to,
                &consent.organizational_providers_disclosure_is_made_to,
            ),
            purposes_of_use: codes(
                ReferenceKind::PurposeOfUse,
                &consent.share_for_purpose_of_use_codes,
            ),
            do_not_share_sensitivity_policies: codes(
                ReferenceKind::SensitivityPolicy,
                &consent.do_not_share_sensitivity_policy_codes,
            ),
            do_not_share_document_types: codes(
                ReferenceKind::ClinicalDocumentType,
                &consent.do_not_share_clinical_document_type_codes,
            ),
            do_not_share_document_sections: codes(
                ReferenceKind::ClinicalDocumentSectionType,
                &consent.do_not_share_clinical_document_section_type_codes,
            ),
            start_date: consent.start_date,
            end_date: consent.end_date,
            created_at: consent.created_at,
        }
    }

    pub fn export_consent_to_xacml(
        &self,
        consent: &Consent,
        patient: &PatientDto,
    ) -> PcmResult<String> {
        Ok(xacml::render_policy(&self.build_view(consent, patient))?)
    }

    pub fn export_consent_to_xacml_pdf_consent_from(
        &self,
        consent: &Consent,
        patient: &PatientDto,
    ) -> PcmResult<String> {
        Ok(xacml::render_pdf_consent_from(&self.build_view(consent, patient))?)
    }

    pub fn export_consent_to_xacml_pdf_consent_to(
        &self,
        consent: &Consent,
        patient: &PatientDto,
    ) -> PcmResult<String> {
        Ok(xacml::render_pdf_consent_to(&self.build_view(consent, patient))?)
    }

    pub fn export_consent_to_cdar2_consent_directive(
        &self,
        consent: &Consent,
        patient: &PatientDto,
    ) -> PcmResult<String> {
        Ok(cdar2::render_consent_directive(&self.build_view(consent, patient))?)
    }

    /// Render all four artifacts from one view.
    pub fn export_all(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<ConsentArtifacts> {
        let view = self.build_view(consent, patient);
        Ok(ConsentArtifacts {
            xacml: xacml::render_policy(&view)?,
            xacml_pdf_consent_from: xacml::render_pdf_consent_from(&view)?,
            xacml_pdf_consent_to: xacml::render_pdf_consent_to(&view)?,
            cdar2: cdar2::render_consent_directive(&view)?,
        })
    }
}

fn providers(
    patient: &PatientDto,
    individuals: &BTreeSet<String>,
    organizations: &BTreeSet<String>,
) -> Vec<ProviderView> {
    let individual = individuals.iter().map(|npi| ProviderView {
        npi: npi.clone(),
        name: patient.provider_name(npi),
        kind: ProviderKind::Individual,
    });
    let organizational = organizations.iter().map(|npi| ProviderView {
        npi: npi.clone(),
        name: patient.provider_name(npi),
        kind: ProviderKind::Organization,
    });
    individual.chain(organizational).collect()
}

fn codes(kind: ReferenceKind, values: &BTreeSet<String>) -> Vec<CodeView> {
    values
        .iter()
        .map(|code| match kind.find(code) {
            Some(concept) => CodeView {
                code: concept.code.to_string(),
                code_system: concept.code_system.to_string(),
                display_name: concept.display_name.to_string(),
            },
            None => CodeView {
                code: code.clone(),
                code_system: String::new(),
                display_name: code.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consent::fixtures::consent;
    use crate::services::dto::fixtures::patient_dto;
    use crate::PcmError;
    use consent_export::ExportError;

    fn service() -> ConsentExportService {
        ConsentExportService::new("2.16.840.1.113883.3.467")
    }

    #[test]
    fn view_resolves_names_and_codes() {
        let view = service().build_view(&consent(1), &patient_dto(1));
        assert_eq!(view.disclosing_providers[0].name, "Valley Health Clinic");
        assert_eq!(view.disclosing_providers[0].kind, ProviderKind::Organization);
        assert_eq!(view.recipient_providers[0].name, "Smith, Jane");
        assert_eq!(view.purposes_of_use[0].display_name, "Treatment");
        assert_eq!(
            view.do_not_share_sensitivity_policies[0].code_system,
            "2.16.840.1.113883.5.4"
        );
        assert_eq!(view.patient.enterprise_identifier, "EID-1");
    }

    #[test]
    fn artifacts_carry_the_policy_id() {
        let c = consent(1);
        let artifacts = service().export_all(&c, &patient_dto(1)).unwrap();
        let escaped_id = c.consent_reference_id.replace('&', "&amp;");
        assert!(artifacts.xacml.contains(&escaped_id));
        assert!(artifacts.cdar2.contains(&escaped_id));
        assert!(artifacts.xacml_pdf_consent_from.contains(":PDF-FROM"));
        assert!(artifacts.xacml_pdf_consent_to.contains(":PDF-TO"));
        assert!(artifacts.cdar2.contains("57016-8"));
        assert_eq!(
            service().export_consent_to_xacml(&c, &patient_dto(1)).unwrap(),
            artifacts.xacml
        );
    }

    #[test]
    fn export_without_recipient_fails() {
        let mut c = consent(1);
        c.providers_disclosure_is_made_to.clear();
        let err = service()
            .export_consent_to_cdar2_consent_directive(&c, &patient_dto(1))
            .unwrap_err();
        assert!(matches!(
            err,
            PcmError::Export(ExportError::NoRecipientProvider)
        ));
    }
}
