//! Key-value storage collaborator.
//!
//! The registry persists through a string-keyed, string-valued store. It reads every key once
//! when opened and rewrites every key after each mutation, so a store only needs `get` and `set`.
//!
//! Two stores are provided:
//! - [`MemoryStore`] keeps everything in a map and is used by tests and throwaway sessions.
//! - [`FileStore`] keeps one file per key in a data directory:
//!
//! ```text
//! clinic_data/
//!   rme_patients.json
//!   rme_doctors.json
//!   rme_appointments.json
//!   rme_medical_records.json
//!   rme_next_patient_id.json
//!   ...
//! ```

use crate::constants::STORE_FILE_EXTENSION;
use crate::error::{ClinicError, ClinicResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key was never written.
    fn get(&self, key: &str) -> ClinicResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> ClinicResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> ClinicResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> ClinicResult<()> {
        (**self).set(key, value)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ClinicResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> ClinicResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key under a single directory.
///
/// Keys are expected to be [`clinic_types::KeyPrefix`]-namespaced names and are validated
/// before being turned into file names.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> ClinicResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ClinicError::StorageDirCreation {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> ClinicResult<PathBuf> {
        let safe = !key.is_empty()
            && key
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'))
            && !key.starts_with('.');
        if !safe {
            return Err(ClinicError::InvalidInput(format!(
                "storage key '{key}' is not safe to use as a file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.{STORE_FILE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ClinicResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClinicError::FileRead(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> ClinicResult<()> {
        let path = self.path_for(key)?;
        fs::write(&path, value).map_err(ClinicError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("rme_patients").expect("get should succeed"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_set_replaces_value() {
        let mut store = MemoryStore::new();
        store.set("k", "1").expect("set should succeed");
        store.set("k", "2").expect("set should succeed");
        assert_eq!(store.get("k").expect("get"), Some("2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("nested").join("clinic");
        let store = FileStore::open(&dir).expect("open should succeed");
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_file_store_round_trips_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut store = FileStore::open(temp_dir.path()).expect("open should succeed");

        assert_eq!(store.get("rme_doctors").expect("get"), None);
        store.set("rme_doctors", "[]").expect("set should succeed");
        assert_eq!(store.get("rme_doctors").expect("get"), Some("[]".into()));
        assert!(temp_dir.path().join("rme_doctors.json").is_file());
    }

    #[test]
    fn test_file_store_rejects_traversal_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut store = FileStore::open(temp_dir.path()).expect("open should succeed");

        let err = store
            .set("../escape", "x")
            .expect_err("traversal key should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
        assert!(store.get("a/b").is_err());
    }
}
