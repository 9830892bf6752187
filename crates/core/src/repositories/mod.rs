//! Record repositories.
//!
//! Every persistent record type implements [`Record`] and is stored behind an object-safe
//! [`Repository`]. Two backends exist:
//! - [`MemoryRepository`]: process-local, used for tests and ephemeral deployments
//! - [`JsonFileRepository`]: one JSON file per record under `<data_dir>/<kind>/<id>.json`
//!
//! The backend is chosen once at startup from [`PcmConfig::storage`].

mod file;
mod memory;

pub use file::JsonFileRepository;
pub use memory::MemoryRepository;

use crate::config::{PcmConfig, StorageBackend};
use crate::domain::{Allergy, Consent, Patient};
use crate::PcmResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A persistent record with a numeric id assigned on first save.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage kind; also the directory name for file storage.
    const KIND: &'static str;

    fn id(&self) -> Option<u64>;

    fn set_id(&mut self, id: u64);
}

impl Record for Consent {
    const KIND: &'static str = "consent";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Record for Patient {
    const KIND: &'static str = "patient";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Record for Allergy {
    const KIND: &'static str = "allergy";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// CRUD access to one record type.
pub trait Repository<T: Record>: Send + Sync {
    /// Insert or replace a record, assigning the next id when it has none.
    fn save(&self, record: T) -> PcmResult<T>;

    fn find_one(&self, id: u64) -> PcmResult<Option<T>>;

    /// All records, ordered by id.
    fn find_all(&self) -> PcmResult<Vec<T>>;

    /// Returns false when no record had this id.
    fn delete(&self, id: u64) -> PcmResult<bool>;

    /// A page of at most `max` records starting at position `first` in id order.
    fn find_entries(&self, first: usize, max: usize) -> PcmResult<Vec<T>> {
        Ok(self.find_all()?.into_iter().skip(first).take(max).collect())
    }

    fn find_matching(&self, predicate: &dyn Fn(&T) -> bool) -> PcmResult<Vec<T>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }

    fn count(&self) -> PcmResult<usize> {
        Ok(self.find_all()?.len())
    }
}

/// Open the configured backend for one record type.
pub fn open_repository<T: Record>(cfg: &PcmConfig) -> PcmResult<Arc<dyn Repository<T>>> {
    Ok(match cfg.storage() {
        StorageBackend::Memory => Arc::new(MemoryRepository::<T>::new()),
        StorageBackend::File => Arc::new(JsonFileRepository::<T>::open(cfg.data_dir())?),
    })
}

pub fn consents_by_patient(
    repo: &dyn Repository<Consent>,
    patient_id: u64,
) -> PcmResult<Vec<Consent>> {
    repo.find_matching(&|c: &Consent| c.patient_id == patient_id)
}

pub fn patient_by_username(
    repo: &dyn Repository<Patient>,
    username: &str,
) -> PcmResult<Option<Patient>> {
    Ok(repo
        .find_matching(&|p: &Patient| p.username == username)?
        .into_iter()
        .next())
}

pub fn allergies_by_patient(
    repo: &dyn Repository<Allergy>,
    patient_id: u64,
) -> PcmResult<Vec<Allergy>> {
    repo.find_matching(&|a: &Allergy| a.patient_id == patient_id)
}
