//! Platform interface for local persistence.

use super::error::StorageResult;

/// Atomic key/value store for small blobs.
///
/// On iOS this is typically backed by files in Application Support written with
/// an atomic rename, on Android by internal storage. Writes must replace the whole
/// value or leave the previous one intact.
#[uniffi::export(with_foreign)]
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn read(&self, key: String) -> StorageResult<Option<Vec<u8>>>;

    /// Writes bytes atomically under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_atomic(&self, key: String, bytes: Vec<u8>) -> StorageResult<()>;

    /// Deletes the blob under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, key: String) -> StorageResult<()>;
}
