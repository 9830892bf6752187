use crate::services::dto::{ConsentDto, PatientDto};
use std::collections::BTreeSet;

/// Generates the policy id shared by a consent's exported artifacts.
pub trait PolicyIdService: Send + Sync {
    fn generate_policy_id(&self, consent: &ConsentDto, patient: &PatientDto) -> String;
}

/// `<mrn>:&<domain oid>&ISO:<disclosing npis>:<recipient npis>:<random suffix>`.
///
/// NPIs on each side are joined with `,` in sorted order; the suffix is eight uppercase hex
/// characters so two consents with the same parties still get distinct ids.
pub struct DefaultPolicyIdService {
    policy_domain_id: String,
}

impl DefaultPolicyIdService {
    pub fn new(policy_domain_id: impl Into<String>) -> Self {
        Self {
            policy_domain_id: policy_domain_id.into(),
        }
    }
}

fn join(npis: &BTreeSet<String>) -> String {
    npis.iter().cloned().collect::<Vec<_>>().join(",")
}

impl PolicyIdService for DefaultPolicyIdService {
    fn generate_policy_id(&self, consent: &ConsentDto, patient: &PatientDto) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase();
        format!(
            "{}:&{}&ISO:{}:{}:{}",
            patient.medical_record_number,
            self.policy_domain_id,
            join(&consent.disclosing_npis()),
            join(&consent.recipient_npis()),
            suffix
        )
    }
}
