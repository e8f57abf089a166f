//! Blob-store collaborator interface.
//!
//! The platform treats binary storage as an external service: callers hand
//! it a content blob under a key and later delete by the same key. Work
//! files, submissions, supplemental files, and chat attachments all go
//! through this trait; the concrete backend is wired at startup.
//!
//! Deletion failures during archive, revision, and room-delete flows are
//! best-effort by design: the owning transition logs and continues.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// Error type for blob-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key does not exist.
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The backend rejected or failed the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// External binary storage, keyed by caller-chosen string keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, returning the key the blob is now
    /// addressable by (normally `key` itself, echoed back).
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Remove the blob stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory [`BlobStore`] used by tests and by the binary when no real
/// backend is configured.
///
/// Keys listed in `missing` fail deletion with [`StorageError::NotFound`],
/// which lets tests exercise the best-effort cleanup paths.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    missing: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as missing: subsequent `delete(key)` calls fail with
    /// `NotFound` even if the key was never stored.
    pub fn simulate_missing(&self, key: &str) {
        self.missing.lock().unwrap().push(key.to_string());
    }

    /// Whether a blob is currently stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.missing.lock().unwrap().iter().any(|k| k == key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        match self.blobs.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_delete_round_trips() {
        let store = MemoryBlobStore::new();

        let key = store.put("jobs/work_1.psd", vec![1, 2, 3], None).await.unwrap();
        assert_eq!(key, "jobs/work_1.psd");
        assert!(store.contains(&key));

        store.delete(&key).await.unwrap();
        assert!(!store.contains(&key));
    }

    #[tokio::test]
    async fn deleting_unknown_key_is_not_found() {
        let store = MemoryBlobStore::new();
        let err = store.delete("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn simulate_missing_forces_delete_failure() {
        let store = MemoryBlobStore::new();
        store.put("k", vec![0], None).await.unwrap();
        store.simulate_missing("k");

        assert!(store.delete("k").await.is_err());
        // The blob itself is untouched; only deletion is sabotaged.
        assert!(store.contains("k"));
    }
}
