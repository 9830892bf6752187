//! Conversions between `api-shared` wire types and `pcm-core` service types.

use api_shared as api;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pcm_core::domain::{
    Allergy, CodedConcept, Consent, IndividualProvider, OrganizationalProvider, Provider,
};
use pcm_core::services::dto::{
    ConsentDto, ConsentListDto, ConsentPdfDto, ConsentRevokationPdfDto, PatientDto,
};
use pcm_core::services::patient::NewPatient;
use pcm_core::PcmError;

pub(crate) fn new_patient(req: api::CreatePatientReq) -> NewPatient {
    NewPatient {
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        enterprise_identifier: req.enterprise_identifier,
        medical_record_number: req.medical_record_number,
        birth_date: req.birth_date,
        gender: req.gender,
    }
}

pub(crate) fn provider(req: api::AddProviderReq) -> Result<Provider, PcmError> {
    let missing = |field: &str| PcmError::InvalidInput(format!("{field} is required"));
    Ok(match req.kind {
        api::ProviderKind::Individual => Provider::Individual(IndividualProvider {
            npi: req.npi,
            first_name: req.first_name.ok_or_else(|| missing("first_name"))?,
            last_name: req.last_name.ok_or_else(|| missing("last_name"))?,
            credential: req.credential,
        }),
        api::ProviderKind::Organizational => Provider::Organizational(OrganizationalProvider {
            npi: req.npi,
            org_name: req.org_name.ok_or_else(|| missing("org_name"))?,
        }),
    })
}

pub(crate) fn patient_res(p: PatientDto) -> api::PatientRes {
    let individuals = p.individual_providers.iter().map(|i| api::ProviderRes {
        npi: i.npi.clone(),
        name: i.display_name(),
        kind: api::ProviderKind::Individual,
    });
    let organizations = p.organizational_providers.iter().map(|o| api::ProviderRes {
        npi: o.npi.clone(),
        name: o.org_name.clone(),
        kind: api::ProviderKind::Organizational,
    });
    let providers = individuals.chain(organizations).collect();

    api::PatientRes {
        id: p.id,
        username: p.username,
        first_name: p.first_name,
        last_name: p.last_name,
        email: p.email,
        enterprise_identifier: p.enterprise_identifier,
        medical_record_number: p.medical_record_number,
        birth_date: p.birth_date,
        gender: p.gender,
        providers,
    }
}

pub(crate) fn consent_dto(t: api::ConsentTerms) -> ConsentDto {
    ConsentDto {
        id: t.id,
        name: t.name,
        description: t.description,
        start_date: t.start_date,
        end_date: t.end_date,
        providers_permitted_to_disclose: t.providers_permitted_to_disclose.into_iter().collect(),
        organizational_providers_permitted_to_disclose: t
            .organizational_providers_permitted_to_disclose
            .into_iter()
            .collect(),
        providers_disclosure_is_made_to: t.providers_disclosure_is_made_to.into_iter().collect(),
        organizational_providers_disclosure_is_made_to: t
            .organizational_providers_disclosure_is_made_to
            .into_iter()
            .collect(),
        do_not_share_clinical_document_type_codes: t
            .do_not_share_clinical_document_type_codes
            .into_iter()
            .collect(),
        do_not_share_clinical_document_section_type_codes: t
            .do_not_share_clinical_document_section_type_codes
            .into_iter()
            .collect(),
        do_not_share_sensitivity_policy_codes: t
            .do_not_share_sensitivity_policy_codes
            .into_iter()
            .collect(),
        share_for_purpose_of_use_codes: t.share_for_purpose_of_use_codes.into_iter().collect(),
    }
}

pub(crate) fn consent_terms(d: ConsentDto) -> api::ConsentTerms {
    api::ConsentTerms {
        id: d.id,
        name: d.name,
        description: d.description,
        start_date: d.start_date,
        end_date: d.end_date,
        providers_permitted_to_disclose: d.providers_permitted_to_disclose.into_iter().collect(),
        organizational_providers_permitted_to_disclose: d
            .organizational_providers_permitted_to_disclose
            .into_iter()
            .collect(),
        providers_disclosure_is_made_to: d.providers_disclosure_is_made_to.into_iter().collect(),
        organizational_providers_disclosure_is_made_to: d
            .organizational_providers_disclosure_is_made_to
            .into_iter()
            .collect(),
        do_not_share_clinical_document_type_codes: d
            .do_not_share_clinical_document_type_codes
            .into_iter()
            .collect(),
        do_not_share_clinical_document_section_type_codes: d
            .do_not_share_clinical_document_section_type_codes
            .into_iter()
            .collect(),
        do_not_share_sensitivity_policy_codes: d
            .do_not_share_sensitivity_policy_codes
            .into_iter()
            .collect(),
        share_for_purpose_of_use_codes: d.share_for_purpose_of_use_codes.into_iter().collect(),
    }
}

pub(crate) fn consent_summary(c: ConsentListDto) -> api::ConsentSummaryRes {
    api::ConsentSummaryRes {
        id: c.id,
        name: c.name,
        description: c.description,
        start_date: c.start_date,
        end_date: c.end_date,
        disclosing_provider_names: c.disclosing_provider_names,
        recipient_provider_names: c.recipient_provider_names,
        do_not_share_clinical_document_types: c.do_not_share_clinical_document_types,
        do_not_share_clinical_document_section_types: c
            .do_not_share_clinical_document_section_types,
        do_not_share_sensitivity_policies: c.do_not_share_sensitivity_policies,
        share_for_purposes_of_use: c.share_for_purposes_of_use,
        stage: c.stage.as_str().to_string(),
        revocation_type: c.revocation_type,
    }
}

/// Entries without an id have not been persisted and are skipped.
pub(crate) fn consent_entry(c: Consent) -> Option<api::ConsentEntryRes> {
    Some(api::ConsentEntryRes {
        id: c.id?,
        patient_id: c.patient_id,
        stage: c.stage().as_str().to_string(),
        name: c.name,
        start_date: c.start_date,
        end_date: c.end_date,
        consent_reference_id: c.consent_reference_id,
    })
}

pub(crate) fn consent_pdf(p: ConsentPdfDto) -> api::ConsentPdfRes {
    api::ConsentPdfRes {
        consent_id: p.id,
        patient_id: p.patient_id,
        consent_name: p.consent_name,
        filename: p.filename,
        content_base64: STANDARD.encode(p.content),
    }
}

pub(crate) fn revocation_pdf(r: ConsentRevokationPdfDto) -> api::RevocationPdfRes {
    api::RevocationPdfRes {
        consent_id: r.consent_id,
        patient_id: r.patient_id,
        revocation_type: r.revocation_type,
        content_base64: r.content.map(|c| STANDARD.encode(c)),
    }
}

pub(crate) fn allergy(patient_id: u64, req: api::AllergyReq) -> Allergy {
    Allergy {
        id: None,
        patient_id,
        allergen: req.allergen,
        reaction: req.reaction,
        severity: req.severity,
        status_code: req.status_code,
        onset_date: req.onset_date,
    }
}

pub(crate) fn allergy_res(a: Allergy) -> Option<api::AllergyRes> {
    Some(api::AllergyRes {
        id: a.id?,
        patient_id: a.patient_id,
        allergen: a.allergen,
        reaction: a.reaction,
        severity: a.severity,
        status_code: a.status_code,
        onset_date: a.onset_date,
    })
}

pub(crate) fn reference_code(c: &CodedConcept) -> api::ReferenceCodeRes {
    api::ReferenceCodeRes {
        code: c.code.to_string(),
        code_system: c.code_system.to_string(),
        code_system_name: c.code_system_name.to_string(),
        display_name: c.display_name.to_string(),
    }
}
