//! Local persistence: a keyed blob store provided by the platform.
//!
//! Two blobs are kept, both JSON: the credential cache and the access log. They are
//! read once when the SDK is initialized and rewritten after every mutation.

pub mod error;
pub mod memory;
pub mod traits;

use serde::{de::DeserializeOwned, Serialize};

pub use error::{StorageError, StorageResult};
pub use memory::MemoryBlobStore;
pub use traits::BlobStore;

/// Key of the cached credential list.
pub const CREDENTIALS_KEY: &str = "access_credentials";
/// Key of the local access log.
pub const ACCESS_LOG_KEY: &str = "access_log";

/// Reads and decodes the JSON blob under `key`.
///
/// # Errors
///
/// Returns an error if the read fails or the blob is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> StorageResult<Option<T>> {
    store
        .read(key.to_string())?
        .map(|bytes| {
            serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
        })
        .transpose()
}

/// Encodes `value` as JSON and writes it atomically under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
    store.write_atomic(key.to_string(), bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_through_store() {
        let store = MemoryBlobStore::new();
        save_json(&store, ACCESS_LOG_KEY, &vec!["a", "b"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&store, ACCESS_LOG_KEY).unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryBlobStore::new();
        let loaded: Option<Vec<String>> = load_json(&store, CREDENTIALS_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_blob_is_serialization_error() {
        let store = MemoryBlobStore::new();
        store
            .write_atomic(CREDENTIALS_KEY.to_string(), b"{not json".to_vec())
            .unwrap();
        let err = load_json::<Vec<String>>(&store, CREDENTIALS_KEY).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
