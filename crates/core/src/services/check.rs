use crate::domain::{Consent, ConsentStage};

/// Finds an existing consent that already governs the same disclosure.
pub trait ConsentCheckService: Send + Sync {
    /// Id of the first consent in `existing` that conflicts with `candidate`.
    fn get_conflict_consent(&self, candidate: &Consent, existing: &[Consent]) -> Option<u64>;
}

/// Two consents conflict when they belong to the same patient, the other one is not revoked,
/// their validity windows overlap, and they share a provider on the disclosing side as well
/// as on the receiving side.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlapConsentCheckService;

impl ConsentCheckService for OverlapConsentCheckService {
    fn get_conflict_consent(&self, candidate: &Consent, existing: &[Consent]) -> Option<u64> {
        let from = candidate.disclosing_npis();
        let to = candidate.recipient_npis();

        existing
            .iter()
            .filter(|other| other.id.is_some() && other.id != candidate.id)
            .filter(|other| other.patient_id == candidate.patient_id)
            .filter(|other| other.stage() != ConsentStage::RevocationRevoked)
            .filter(|other| candidate.overlaps_in_time(other))
            .find(|other| {
                !from.is_disjoint(&other.disclosing_npis()) && !to.is_disjoint(&other.recipient_npis())
            })
            .and_then(|other| other.id)
    }
}
