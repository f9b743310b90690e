use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, error};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::KeyValueStore;

/// Process-local backend. Contents are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|e| {
            error!("Memory storage lock poisoned: {}", e);
            StorageError::ConnectionFailed
        })?;
        debug!("Read key {} from memory", key);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|e| {
            error!("Memory storage lock poisoned: {}", e);
            StorageError::ConnectionFailed
        })?;
        items.insert(key.to_string(), value.to_string());
        debug!("Wrote {} byte(s) to key {} in memory", value.len(), key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|e| {
            error!("Memory storage lock poisoned: {}", e);
            StorageError::ConnectionFailed
        })?;
        items.remove(key);
        Ok(())
    }
}
