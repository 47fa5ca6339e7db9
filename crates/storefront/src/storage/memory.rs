use super::{Storage, StorageError, StorageKey};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory storage for tests and ephemeral sessions. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<StorageKey, String>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.records().get(key).cloned())
    }

    fn write(&self, key: &StorageKey, value: &str) -> Result<(), StorageError> {
        self.records().insert(key.clone(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.records().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StorageKey>, StorageError> {
        Ok(self.records().keys().cloned().collect())
    }
}
