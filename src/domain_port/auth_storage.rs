use crate::domain_model::StorageKey;

/// Synchronous key-value slots holding the session, in the spirit of
/// browser local storage.
pub trait AuthStorage: Send + Sync {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt storage: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}
