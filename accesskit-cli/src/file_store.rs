//! File-backed blob store for the CLI's local state.
//!
//! Each key is one file in the data directory. Writes go to a temporary file
//! that is synced and renamed over the target, so a crash leaves either the old
//! or the new content.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use accesskit_core::storage::{BlobStore, StorageError, StorageResult};

fn io_error(context: &str, path: &Path, err: &std::io::Error) -> StorageError {
    StorageError::BlobStore(format!("{context} '{}': {err}", path.display()))
}

#[derive(Debug, Clone)]
pub struct FileBlobStore {
    directory: PathBuf,
}

impl FileBlobStore {
    /// Opens the store, creating `directory` if needed.
    pub fn new(directory: impl AsRef<Path>) -> StorageResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .map_err(|e| io_error("failed to create data directory", &directory, &e))?;
        Ok(Self { directory })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!(".{key}.json.tmp"))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: String) -> StorageResult<Option<Vec<u8>>> {
        let path = self.blob_path(&key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("failed to read", &path, &e)),
        }
    }

    fn write_atomic(&self, key: String, bytes: Vec<u8>) -> StorageResult<()> {
        let path = self.blob_path(&key);
        let temp = self.temp_path(&key);

        let mut file =
            File::create(&temp).map_err(|e| io_error("failed to create", &temp, &e))?;
        file.write_all(&bytes)
            .map_err(|e| io_error("failed to write", &temp, &e))?;
        file.sync_all()
            .map_err(|e| io_error("failed to sync", &temp, &e))?;
        drop(file);

        fs::rename(&temp, &path).map_err(|e| io_error("failed to replace", &path, &e))
    }

    fn delete(&self, key: String) -> StorageResult<()> {
        let path = self.blob_path(&key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("failed to delete", &path, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("nested")).unwrap();

        assert_eq!(store.read("access_log".to_string()).unwrap(), None);

        store
            .write_atomic("access_log".to_string(), b"[]".to_vec())
            .unwrap();
        store
            .write_atomic("access_log".to_string(), b"[1]".to_vec())
            .unwrap();
        assert_eq!(
            store.read("access_log".to_string()).unwrap(),
            Some(b"[1]".to_vec())
        );
        assert!(!store.temp_path("access_log").exists());

        store.delete("access_log".to_string()).unwrap();
        store.delete("access_log".to_string()).unwrap();
        assert_eq!(store.read("access_log".to_string()).unwrap(), None);
    }
}
