//! JSON-file record storage.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   consent/
//!     .last_id
//!     1.json
//!     2.json
//!   patient/
//!     .last_id
//!     1.json
//! ```
//!
//! `.last_id` holds the highest id ever allocated, so ids of deleted records are not handed
//! out again. Writes go to a temporary sibling file which is then renamed over the target, so
//! a reader never sees a half-written record.

use super::{Record, Repository};
use crate::{PcmError, PcmResult};
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonFileRepository<T> {
    dir: PathBuf,
    // Serialises id allocation and writes within this process.
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileRepository<T> {
    /// Open (creating if needed) `<data_dir>/<T::KIND>/`.
    pub fn open(data_dir: &Path) -> PcmResult<Self> {
        let dir = data_dir.join(T::KIND);
        fs::create_dir_all(&dir).map_err(PcmError::StorageDirCreation)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn stored_ids(&self) -> PcmResult<Vec<u64>> {
        let mut ids: Vec<u64> = fs::read_dir(&self.dir)
            .map_err(PcmError::FileRead)?
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    return None;
                }
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse().ok())
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn last_id_path(&self) -> PathBuf {
        self.dir.join(".last_id")
    }

    fn read_last_id(&self) -> PcmResult<u64> {
        match fs::read_to_string(self.last_id_path()) {
            Ok(contents) => Ok(contents.trim().parse().unwrap_or(0)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(PcmError::FileRead(e)),
        }
    }

    /// Next id above both the high-water mark and any record already on disk.
    fn allocate_id(&self) -> PcmResult<u64> {
        let on_disk = self.stored_ids()?.last().copied().unwrap_or(0);
        let id = self.read_last_id()?.max(on_disk) + 1;
        self.write_atomically(&self.last_id_path(), id.to_string())?;
        Ok(id)
    }

    fn write_atomically(&self, target: &Path, contents: String) -> PcmResult<()> {
        let Some(name) = target.file_name().and_then(|n| n.to_str()) else {
            return Err(PcmError::FileWrite(std::io::Error::new(
                ErrorKind::InvalidInput,
                "record path has no file name",
            )));
        };
        let tmp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, contents).map_err(PcmError::FileWrite)?;
        fs::rename(&tmp, target).map_err(PcmError::FileWrite)
    }

    fn read_record(&self, id: u64) -> PcmResult<Option<T>> {
        let contents = match fs::read_to_string(self.record_path(id)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PcmError::FileRead(e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(PcmError::Deserialization)
    }
}

impl<T: Record> Repository<T> for JsonFileRepository<T> {
    fn save(&self, mut record: T) -> PcmResult<T> {
        let _guard = self.write_lock.lock().map_err(|_| PcmError::LockPoisoned)?;

        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = self.allocate_id()?;
                record.set_id(id);
                id
            }
        };

        let json = serde_json::to_string_pretty(&record).map_err(PcmError::Serialization)?;
        let target = self.record_path(id);
        self.write_atomically(&target, json)?;

        tracing::debug!(kind = T::KIND, id, "record written to {}", target.display());
        Ok(record)
    }

    fn find_one(&self, id: u64) -> PcmResult<Option<T>> {
        self.read_record(id)
    }

    fn find_all(&self) -> PcmResult<Vec<T>> {
        let mut records = Vec::new();
        for id in self.stored_ids()? {
            match self.read_record(id) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(kind = T::KIND, id, "skipping unreadable record: {e}");
                }
            }
        }
        Ok(records)
    }

    fn delete(&self, id: u64) -> PcmResult<bool> {
        let _guard = self.write_lock.lock().map_err(|_| PcmError::LockPoisoned)?;
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PcmError::FileDelete(e)),
        }
    }

    /// Counts readable records only, matching [`Repository::find_all`].
    fn count(&self) -> PcmResult<usize> {
        Ok(self.find_all()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consent::fixtures::consent;
    use crate::domain::Consent;
    use tempfile::TempDir;

    #[test]
    fn saves_one_file_per_record() {
        let temp_dir = TempDir::new().expect("tempdir");
        let repo = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();

        let saved = repo.save(consent(7)).unwrap();
        assert_eq!(saved.id, Some(1));
        let path = temp_dir.path().join("consent").join("1.json");
        assert!(path.is_file());

        let reopened = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.find_one(1).unwrap(), Some(saved));
        assert_eq!(reopened.save(consent(7)).unwrap().id, Some(2));
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let temp_dir = TempDir::new().expect("tempdir");
        let repo = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();
        repo.save(consent(1)).unwrap();
        fs::write(temp_dir.path().join("consent").join("2.json"), "{not json").unwrap();
        fs::write(temp_dir.path().join("consent").join("notes.txt"), "ignored").unwrap();

        let all = repo.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(repo.count().unwrap(), 1);
        assert!(matches!(
            repo.find_one(2),
            Err(PcmError::Deserialization(_))
        ));
    }

    #[test]
    fn delete_reports_missing_records() {
        let temp_dir = TempDir::new().expect("tempdir");
        let repo = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();
        let saved = repo.save(consent(1)).unwrap();

        assert!(repo.delete(saved.id.unwrap()).unwrap());
        assert!(!repo.delete(saved.id.unwrap()).unwrap());
        assert_eq!(repo.find_one(1).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let temp_dir = TempDir::new().expect("tempdir");
        let repo = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();
        repo.save(consent(1)).unwrap();
        let last = repo.save(consent(1)).unwrap().id.unwrap();
        assert!(repo.delete(last).unwrap());

        assert_eq!(repo.save(consent(1)).unwrap().id, Some(last + 1));

        let reopened = JsonFileRepository::<Consent>::open(temp_dir.path()).unwrap();
        assert!(reopened.delete(last + 1).unwrap());
        assert_eq!(reopened.save(consent(1)).unwrap().id, Some(last + 2));
    }
}
