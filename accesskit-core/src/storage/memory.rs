//! In-memory blob store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{error::StorageError, traits::BlobStore, StorageResult};

/// Blob store kept in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: String) -> StorageResult<Option<Vec<u8>>> {
        let guard = self
            .blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    fn write_atomic(&self, key: String, bytes: Vec<u8>) -> StorageResult<()> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?
            .insert(key, bytes);
        Ok(())
    }

    fn delete(&self, key: String) -> StorageResult<()> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?
            .remove(&key);
        Ok(())
    }
}
