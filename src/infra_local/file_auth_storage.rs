use crate::domain_model::StorageKey;
use crate::domain_port::{AuthStorage, StorageError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keeps the session slots in a JSON object on disk so a login survives
/// restarts. Every write rewrites the whole file through a temp file and a
/// rename.
#[derive(Debug)]
pub struct FileAuthStorage {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, String>>,
}

impl FileAuthStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let slots = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(slots)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl AuthStorage for FileAuthStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(key.as_str()).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(key.as_str().to_owned(), value.to_owned());
        self.flush(&slots)
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        if slots.remove(key.as_str()).is_some() {
            self.flush(&slots)?;
        }
        Ok(())
    }
}
