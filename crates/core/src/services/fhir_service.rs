//! FHIR mapping and HIE publication of patients and consents.

use crate::domain::{Consent, ReferenceKind};
use crate::infrastructure::hie::HieClient;
use crate::services::dto::PatientDto;
use crate::{PcmError, PcmResult};
use fhir::{
    ActorKind, ActorRole, AdministrativeGender, Coding, Contract, ContractActor, ContractData,
    ContractSignature, PatientData,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const LOINC_SYSTEM: &str = "http://loinc.org";
const PRIVACY_CONSENT_CODE: &str = "57016-8";

fn oid_system(oid: &str) -> String {
    format!("urn:oid:{oid}")
}

#[derive(Clone, Debug)]
pub struct FhirPatientService {
    policy_domain_id: String,
}

impl FhirPatientService {
    pub fn new(policy_domain_id: impl Into<String>) -> Self {
        Self {
            policy_domain_id: policy_domain_id.into(),
        }
    }

    pub fn create_fhir_patient(&self, patient: &PatientDto) -> PatientData {
        PatientData {
            id: format!("patient-{}", patient.id),
            identifier_system: oid_system(&self.policy_domain_id),
            medical_record_number: patient.medical_record_number.clone(),
            family: patient.last_name.clone(),
            given: vec![patient.first_name.clone()],
            email: Some(patient.email.clone()),
            gender: patient.gender.as_deref().map(AdministrativeGender::from_v3_code),
            birth_date: patient.birth_date,
        }
    }

    pub fn render_fhir_patient(&self, patient: &PatientDto) -> PcmResult<String> {
        Ok(fhir::Patient::render(&self.create_fhir_patient(patient))?)
    }
}

#[derive(Clone)]
pub struct FhirContractService {
    patients: FhirPatientService,
    policy_domain_id: String,
    hie: Option<Arc<dyn HieClient>>,
}

impl FhirContractService {
    pub fn new(policy_domain_id: impl Into<String>, hie: Option<Arc<dyn HieClient>>) -> Self {
        let policy_domain_id = policy_domain_id.into();
        Self {
            patients: FhirPatientService::new(policy_domain_id.clone()),
            policy_domain_id,
            hie,
        }
    }

    pub fn create_fhir_contract(&self, consent: &Consent, patient: &PatientDto) -> ContractData {
        let actors_for = |individuals: &BTreeSet<String>,
                          organizations: &BTreeSet<String>,
                          role: ActorRole| {
            let individual = individuals.iter().map(move |npi| ContractActor {
                npi: npi.clone(),
                name: patient.provider_name(npi),
                kind: ActorKind::Practitioner,
                role,
            });
            let organizational = organizations.iter().map(move |npi| ContractActor {
                npi: npi.clone(),
                name: patient.provider_name(npi),
                kind: ActorKind::Organization,
                role,
            });
            individual.chain(organizational).collect::<Vec<_>>()
        };

        let mut actors = actors_for(
            &consent.providers_permitted_to_disclose,
            &consent.organizational_providers_permitted_to_disclose,
            ActorRole::Intermediary,
        );
        actors.extend(actors_for(
            &consent.providers_disclosure_is_made_to,
            &consent.organizational_providers_disclosure_is_made_to,
            ActorRole::Recipient,
        ));

        let withheld = [
            (
                ReferenceKind::SensitivityPolicy,
                &consent.do_not_share_sensitivity_policy_codes,
            ),
            (
                ReferenceKind::ClinicalDocumentType,
                &consent.do_not_share_clinical_document_type_codes,
            ),
            (
                ReferenceKind::ClinicalDocumentSectionType,
                &consent.do_not_share_clinical_document_section_type_codes,
            ),
        ]
        .into_iter()
        .flat_map(|(kind, codes)| codes.iter().map(move |code| coding(kind, code)))
        .collect();

        let signature = consent
            .signed_pdf_consent
            .as_ref()
            .filter(|s| s.is_signed())
            .and_then(|s| {
                s.document_signed_date_time.map(|signed_at| ContractSignature {
                    signed_at,
                    signer_email: s.signer_email.clone(),
                })
            });

        ContractData {
            id: Contract::resource_id(&consent.consent_reference_id),
            policy_id: consent.consent_reference_id.clone(),
            identifier_system: oid_system(&self.policy_domain_id),
            issued: consent.created_at,
            applies_start: consent.start_date,
            applies_end: consent.end_date,
            contract_type: Some(Coding {
                system: LOINC_SYSTEM.into(),
                code: PRIVACY_CONSENT_CODE.into(),
                display: Some("Privacy policy acknowledgement Document".into()),
            }),
            patient: PatientData {
                id: "patient".into(),
                ..self.patients.create_fhir_patient(patient)
            },
            actors,
            purposes_of_use: consent
                .share_for_purpose_of_use_codes
                .iter()
                .map(|code| coding(ReferenceKind::PurposeOfUse, code))
                .collect(),
            withheld,
            signature,
        }
    }

    pub fn render_fhir_contract(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<String> {
        Ok(Contract::render(&self.create_fhir_contract(consent, patient))?)
    }

    /// PUT the contract to the configured exchange.
    ///
    /// # Errors
    ///
    /// Returns [`PcmError::Hie`] when no exchange is configured or it rejects the contract.
    pub async fn publish_fhir_contract_to_hie(&self, contract: &ContractData) -> PcmResult<()> {
        let hie = self
            .hie
            .as_ref()
            .ok_or_else(|| PcmError::Hie("no HIE endpoint configured".into()))?;
        let json = Contract::render(contract)?;
        hie.publish_contract(&contract.id, json).await
    }

    pub async fn publish_consent_to_hie(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<()> {
        let contract = self.create_fhir_contract(consent, patient);
        self.publish_fhir_contract_to_hie(&contract).await
    }
}

fn coding(kind: ReferenceKind, code: &str) -> Coding {
    match kind.find(code) {
        Some(concept) => Coding {
            system: oid_system(concept.code_system),
            code: concept.code.to_string(),
            display: Some(concept.display_name.to_string()),
        },
        None => Coding {
            system: String::new(),
            code: code.to_string(),
            display: None,
        },
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records every published contract; rejects them while `unavailable` is set.
    #[derive(Default)]
    pub struct RecordingHie {
        pub published: Mutex<Vec<(String, String)>>,
        pub unavailable: AtomicBool,
    }

    #[async_trait]
    impl HieClient for RecordingHie {
        async fn publish_contract(&self, resource_id: &str, contract_json: String) -> PcmResult<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PcmError::Hie("exchange unavailable".into()));
            }
            self.published
                .lock()
                .unwrap()
                .push((resource_id.to_string(), contract_json));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::RecordingHie;
    use super::*;
    use crate::domain::consent::fixtures::{consent, signed};
    use crate::services::dto::fixtures::patient_dto;
    use chrono::{TimeZone, Utc};

    const OID: &str = "2.16.840.1.113883.3.467";

    #[test]
    fn fhir_patient_maps_identity() {
        let p = FhirPatientService::new(OID).create_fhir_patient(&patient_dto(3));
        assert_eq!(p.id, "patient-3");
        assert_eq!(p.identifier_system, "urn:oid:2.16.840.1.113883.3.467");
        assert_eq!(p.family, "Doe");
        assert_eq!(p.gender, Some(AdministrativeGender::Male));
    }

    #[test]
    fn contract_lists_both_sides_and_withheld_codes() {
        let svc = FhirContractService::new(OID, None);
        let contract = svc.create_fhir_contract(&consent(1), &patient_dto(1));

        assert_eq!(contract.actors.len(), 2);
        assert_eq!(contract.actors[0].role, ActorRole::Intermediary);
        assert_eq!(contract.actors[0].kind, ActorKind::Organization);
        assert_eq!(contract.actors[1].role, ActorRole::Recipient);
        assert_eq!(contract.actors[1].name, "Smith, Jane");
        assert_eq!(contract.withheld[0].code, "ETH");
        assert_eq!(contract.purposes_of_use[0].display.as_deref(), Some("Treatment"));
        assert!(contract.signature.is_none());
        assert!(!contract.id.contains('&'));
    }

    #[test]
    fn signed_consent_carries_signature() {
        let mut c = consent(1);
        let mut s = signed("SIGNED", Some(vec![1]));
        s.document_signed_date_time = Some(Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap());
        c.signed_pdf_consent = Some(s);

        let contract = FhirContractService::new(OID, None).create_fhir_contract(&c, &patient_dto(1));
        let sig = contract.signature.expect("signature");
        assert_eq!(sig.signer_email, "john.doe@example.com");
    }

    #[tokio::test]
    async fn publishes_rendered_contract() {
        let hie = Arc::new(RecordingHie::default());
        let svc = FhirContractService::new(OID, Some(hie.clone()));
        svc.publish_consent_to_hie(&consent(1), &patient_dto(1))
            .await
            .unwrap();

        let published = hie.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        let parsed = Contract::parse(&published[0].1).unwrap();
        assert_eq!(parsed.id, published[0].0);
        assert_eq!(parsed.policy_id, consent(1).consent_reference_id);
    }

    #[tokio::test]
    async fn publishing_without_exchange_fails() {
        let svc = FhirContractService::new(OID, None);
        let err = svc
            .publish_consent_to_hie(&consent(1), &patient_dto(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PcmError::Hie(_)));
    }
}
