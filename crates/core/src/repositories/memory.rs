use super::{Record, Repository};
use crate::{PcmError, PcmResult};
use std::collections::BTreeMap;
use std::sync::RwLock;

struct State<T> {
    records: BTreeMap<u64, T>,
    last_id: u64,
}

pub struct MemoryRepository<T> {
    state: RwLock<State<T>>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                records: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for MemoryRepository<T> {
    fn save(&self, mut record: T) -> PcmResult<T> {
        let mut state = self.state.write().map_err(|_| PcmError::LockPoisoned)?;
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = state.last_id + 1;
                record.set_id(id);
                id
            }
        };
        state.last_id = state.last_id.max(id);
        state.records.insert(id, record.clone());
        Ok(record)
    }

    fn find_one(&self, id: u64) -> PcmResult<Option<T>> {
        let state = self.state.read().map_err(|_| PcmError::LockPoisoned)?;
        Ok(state.records.get(&id).cloned())
    }

    fn find_all(&self) -> PcmResult<Vec<T>> {
        let state = self.state.read().map_err(|_| PcmError::LockPoisoned)?;
        Ok(state.records.values().cloned().collect())
    }

    fn delete(&self, id: u64) -> PcmResult<bool> {
        let mut state = self.state.write().map_err(|_| PcmError::LockPoisoned)?;
        Ok(state.records.remove(&id).is_some())
    }

    fn count(&self) -> PcmResult<usize> {
        let state = self.state.read().map_err(|_| PcmError::LockPoisoned)?;
        Ok(state.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consent::fixtures::consent;
    use crate::domain::Consent;

    #[test]
    fn assigns_increasing_ids_and_replaces_on_resave() {
        let repo = MemoryRepository::<Consent>::new();
        let first = repo.save(consent(1)).unwrap();
        let second = repo.save(consent(1)).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let mut renamed = first.clone();
        renamed.name = "Renamed".into();
        repo.save(renamed).unwrap();
        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.find_one(1).unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let repo = MemoryRepository::<Consent>::new();
        repo.save(consent(1)).unwrap();
        let second = repo.save(consent(1)).unwrap();
        assert!(repo.delete(second.id.unwrap()).unwrap());
        assert!(!repo.delete(second.id.unwrap()).unwrap());
        assert_eq!(repo.save(consent(1)).unwrap().id, Some(3));
    }
}
