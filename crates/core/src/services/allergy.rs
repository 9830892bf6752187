use crate::domain::{Allergy, ReferenceKind};
use crate::repositories::{allergies_by_patient, Repository};
use crate::{PcmError, PcmResult};
use pcm_types::NonEmptyText;
use std::sync::Arc;

/// CRUD over patient allergies.
pub struct AllergyService {
    allergies: Arc<dyn Repository<Allergy>>,
}

impl AllergyService {
    pub fn new(allergies: Arc<dyn Repository<Allergy>>) -> Self {
        Self { allergies }
    }

    pub fn count_all_allergys(&self) -> PcmResult<usize> {
        self.allergies.count()
    }

    pub fn delete_allergy(&self, id: u64) -> PcmResult<bool> {
        self.allergies.delete(id)
    }

    pub fn find_allergy(&self, id: u64) -> PcmResult<Option<Allergy>> {
        self.allergies.find_one(id)
    }

    pub fn find_all_allergys(&self) -> PcmResult<Vec<Allergy>> {
        self.allergies.find_all()
    }

    pub fn find_allergy_entries(&self, first: usize, max: usize) -> PcmResult<Vec<Allergy>> {
        self.allergies.find_entries(first, max)
    }

    pub fn find_allergies_by_patient(&self, patient_id: u64) -> PcmResult<Vec<Allergy>> {
        allergies_by_patient(self.allergies.as_ref(), patient_id)
    }

    pub fn save_allergy(&self, allergy: Allergy) -> PcmResult<Allergy> {
        validate(&allergy)?;
        self.allergies.save(allergy)
    }

    /// Replace an existing allergy; the id must be present and known.
    pub fn update_allergy(&self, allergy: Allergy) -> PcmResult<Allergy> {
        let id = allergy
            .id
            .ok_or_else(|| PcmError::InvalidInput("allergy id is required for update".into()))?;
        if self.allergies.find_one(id)?.is_none() {
            return Err(PcmError::NotFound { kind: "allergy", id });
        }
        validate(&allergy)?;
        self.allergies.save(allergy)
    }
}

fn validate(allergy: &Allergy) -> PcmResult<()> {
    NonEmptyText::new(&allergy.allergen)?;
    if ReferenceKind::ResultStatus.find(&allergy.status_code).is_none() {
        return Err(PcmError::InvalidInput(format!(
            "unknown result status '{}'",
            allergy.status_code
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryRepository;

    fn allergy(patient_id: u64) -> Allergy {
        Allergy {
            id: None,
            patient_id,
            allergen: "Penicillin".into(),
            reaction: Some("Hives".into()),
            severity: Some("moderate".into()),
            status_code: "F".into(),
            onset_date: None,
        }
    }

    fn service() -> AllergyService {
        AllergyService::new(Arc::new(MemoryRepository::new()))
    }

    #[test]
    fn crud_round() {
        let svc = service();
        let saved = svc.save_allergy(allergy(1)).unwrap();
        svc.save_allergy(allergy(2)).unwrap();
        assert_eq!(svc.count_all_allergys().unwrap(), 2);
        assert_eq!(svc.find_allergies_by_patient(1).unwrap().len(), 1);

        let mut changed = saved.clone();
        changed.severity = Some("severe".into());
        svc.update_allergy(changed).unwrap();
        assert_eq!(
            svc.find_allergy(1).unwrap().unwrap().severity.as_deref(),
            Some("severe")
        );

        assert!(svc.delete_allergy(1).unwrap());
        assert_eq!(svc.find_all_allergys().unwrap().len(), 1);
        assert_eq!(svc.find_allergy_entries(0, 10).unwrap().len(), 1);
    }

    #[test]
    fn status_code_must_be_known() {
        let mut bad = allergy(1);
        bad.status_code = "Q".into();
        assert!(matches!(
            service().save_allergy(bad),
            Err(PcmError::InvalidInput(_))
        ));
    }

    #[test]
    fn update_requires_existing_id() {
        let svc = service();
        assert!(matches!(
            svc.update_allergy(allergy(1)),
            Err(PcmError::InvalidInput(_))
        ));
        let mut ghost = allergy(1);
        ghost.id = Some(42);
        assert!(matches!(
            svc.update_allergy(ghost),
            Err(PcmError::NotFound { kind: "allergy", id: 42 })
        ));
    }
}
