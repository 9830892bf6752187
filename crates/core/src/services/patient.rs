//! Patient registration and the patient's provider list.

use crate::domain::{Patient, Provider};
use crate::repositories::{patient_by_username, Repository};
use crate::services::dto::PatientDto;
use crate::{PcmError, PcmResult};
use chrono::NaiveDate;
use pcm_types::{EmailAddress, NonEmptyText, Npi};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registration details for a new patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub enterprise_identifier: Option<String>,
    pub medical_record_number: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
}

pub struct PatientService {
    patients: Arc<dyn Repository<Patient>>,
}

impl PatientService {
    pub fn new(patients: Arc<dyn Repository<Patient>>) -> Self {
        Self { patients }
    }

    /// Validate and store a new patient.
    ///
    /// # Errors
    ///
    /// Returns [`PcmError`] if:
    /// - a name, username or medical record number is blank,
    /// - the email address is malformed,
    /// - the username is already taken.
    pub fn create_patient(&self, new: NewPatient) -> PcmResult<Patient> {
        let username = NonEmptyText::new(&new.username)?;
        let first_name = NonEmptyText::new(&new.first_name)?;
        let last_name = NonEmptyText::new(&new.last_name)?;
        let email = EmailAddress::parse(&new.email)?;
        let mrn = NonEmptyText::new(&new.medical_record_number)?;

        if patient_by_username(self.patients.as_ref(), username.as_str())?.is_some() {
            return Err(PcmError::InvalidInput(format!(
                "username '{username}' is already registered"
            )));
        }

        let patient = self.patients.save(Patient {
            id: None,
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            enterprise_identifier: new
                .enterprise_identifier
                .filter(|e| !e.trim().is_empty()),
            medical_record_number: mrn.to_string(),
            birth_date: new.birth_date,
            gender: new.gender.map(|g| g.trim().to_ascii_uppercase()),
            individual_providers: Vec::new(),
            organizational_providers: Vec::new(),
        })?;

        tracing::info!(patient_id = ?patient.id, "patient registered");
        Ok(patient)
    }

    pub fn find_patient(&self, id: u64) -> PcmResult<Option<Patient>> {
        self.patients.find_one(id)
    }

    pub fn find_by_username(&self, username: &str) -> PcmResult<Option<Patient>> {
        patient_by_username(self.patients.as_ref(), username)
    }

    pub fn list_patients(&self) -> PcmResult<Vec<Patient>> {
        self.patients.find_all()
    }

    /// Add a provider to the patient's list. Re-adding the same NPI replaces the entry.
    pub fn add_provider(&self, patient_id: u64, provider: Provider) -> PcmResult<Patient> {
        Npi::parse(provider.npi())?;
        let mut patient = self.patients.find_one(patient_id)?.ok_or(PcmError::NotFound {
            kind: "patient",
            id: patient_id,
        })?;

        let npi = provider.npi().to_string();
        patient.individual_providers.retain(|p| p.npi != npi);
        patient.organizational_providers.retain(|p| p.npi != npi);
        match provider {
            Provider::Individual(p) => {
                NonEmptyText::new(&p.last_name)?;
                patient.individual_providers.push(p);
            }
            Provider::Organizational(o) => {
                NonEmptyText::new(&o.org_name)?;
                patient.organizational_providers.push(o);
            }
        }

        let patient = self.patients.save(patient)?;
        tracing::info!(patient_id, npi = %npi, "provider added");
        Ok(patient)
    }

    pub fn find_patient_dto(&self, id: u64) -> PcmResult<PatientDto> {
        self.patients
            .find_one(id)?
            .ok_or(PcmError::NotFound { kind: "patient", id })?
            .try_into()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::{IndividualProvider, OrganizationalProvider};
    use crate::repositories::MemoryRepository;

    pub fn new_patient(username: &str) -> NewPatient {
        NewPatient {
            username: username.into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "John.Doe@Example.com".into(),
            enterprise_identifier: Some("EID-1".into()),
            medical_record_number: "MRN-1".into(),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 17),
            gender: Some("m".into()),
        }
    }

    /// A service holding patient 1 with two individual providers and one organization.
    pub fn service_with_patient() -> PatientService {
        let svc = PatientService::new(Arc::new(MemoryRepository::new()));
        let patient = svc.create_patient(new_patient("jdoe")).unwrap();
        let id = patient.id.unwrap();
        svc.add_provider(
            id,
            Provider::Organizational(OrganizationalProvider {
                npi: "1083949036".into(),
                org_name: "Valley Health Clinic".into(),
            }),
        )
        .unwrap();
        for (npi, first, last) in [("1174858088", "Jane", "Smith"), ("1245319599", "Alan", "Jones")]
        {
            svc.add_provider(
                id,
                Provider::Individual(IndividualProvider {
                    npi: npi.into(),
                    first_name: first.into(),
                    last_name: last.into(),
                    credential: None,
                }),
            )
            .unwrap();
        }
        svc
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{new_patient, service_with_patient};
    use super::*;
    use crate::domain::OrganizationalProvider;
    use crate::repositories::MemoryRepository;

    #[test]
    fn create_normalises_email_and_gender() {
        let svc = PatientService::new(Arc::new(MemoryRepository::new()));
        let p = svc.create_patient(new_patient("jdoe")).unwrap();
        assert_eq!(p.id, Some(1));
        assert_eq!(p.email, "john.doe@example.com");
        assert_eq!(p.gender.as_deref(), Some("M"));
    }

    #[test]
    fn usernames_are_unique() {
        let svc = PatientService::new(Arc::new(MemoryRepository::new()));
        svc.create_patient(new_patient("jdoe")).unwrap();
        assert!(matches!(
            svc.create_patient(new_patient("jdoe")),
            Err(PcmError::InvalidInput(_))
        ));
        assert!(svc.find_by_username("jdoe").unwrap().is_some());
    }

    #[test]
    fn rejects_blank_names_and_bad_email() {
        let svc = PatientService::new(Arc::new(MemoryRepository::new()));
        let mut blank = new_patient("a");
        blank.first_name = "  ".into();
        assert!(matches!(svc.create_patient(blank), Err(PcmError::Text(_))));

        let mut bad_email = new_patient("b");
        bad_email.email = "not-an-email".into();
        assert!(matches!(svc.create_patient(bad_email), Err(PcmError::Text(_))));
    }

    #[test]
    fn providers_are_keyed_by_npi() {
        let svc = service_with_patient();
        let dto = svc.find_patient_dto(1).unwrap();
        assert_eq!(dto.individual_providers.len(), 2);
        assert_eq!(dto.organizational_providers.len(), 1);

        let updated = svc
            .add_provider(
                1,
                Provider::Organizational(OrganizationalProvider {
                    npi: "1083949036".into(),
                    org_name: "Valley Health".into(),
                }),
            )
            .unwrap();
        assert_eq!(updated.organizational_providers.len(), 1);
        assert_eq!(updated.organizational_providers[0].org_name, "Valley Health");
    }

    #[test]
    fn add_provider_validates_npi_and_patient() {
        let svc = service_with_patient();
        let bad = Provider::Organizational(OrganizationalProvider {
            npi: "123".into(),
            org_name: "Clinic".into(),
        });
        assert!(matches!(svc.add_provider(1, bad), Err(PcmError::Text(_))));

        let good = Provider::Organizational(OrganizationalProvider {
            npi: "1083949036".into(),
            org_name: "Clinic".into(),
        });
        assert!(matches!(
            svc.add_provider(99, good),
            Err(PcmError::NotFound { kind: "patient", id: 99 })
        ));
    }
}
