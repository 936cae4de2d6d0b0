use crate::domain_model::StorageKey;
use crate::domain_port::{AuthStorage, StorageError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local storage. Sessions end with the process.
#[derive(Debug, Default)]
pub struct MemoryAuthStorage {
    slots: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryAuthStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthStorage for MemoryAuthStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(&key);
        Ok(())
    }
}
