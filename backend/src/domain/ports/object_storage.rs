//! Port for the object-storage collaborator.
//!
//! Any backend able to hold opaque blobs and mint time-limited read URLs can
//! satisfy this port: a cloud blob store, a signing proxy, or the in-memory
//! fake used by tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by object-storage adapters, distinguishable by cause.
    pub enum ObjectStorageError {
        /// The container or object does not exist.
        NotFound { message: String } =>
            "storage object not found: {message}",
        /// The backend rejected the caller's credentials.
        PermissionDenied { message: String } =>
            "storage permission denied: {message}",
        /// The backend rejected the request itself.
        BadRequest { message: String } =>
            "storage rejected request: {message}",
        /// Any other backend failure.
        Backend { message: String } =>
            "storage backend error: {message}",
    }
}

/// Port for uploading objects and minting time-limited signed read URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `destination` in `container`; returns the stored
    /// object key.
    async fn upload<'a>(
        &self,
        container: &str,
        bytes: Vec<u8>,
        destination: &str,
        content_type: Option<&'a str>,
    ) -> Result<String, ObjectStorageError>;

    /// Mint a fresh, expiring read URL for `object_key`. Every call returns
    /// a new URL; nothing is cached.
    async fn sign_for_read(
        &self,
        container: &str,
        object_key: &str,
    ) -> Result<String, ObjectStorageError>;
}

/// In-memory storage double for tests and storage-less boots.
///
/// Uploads land in a map; signed URLs embed a monotonically increasing
/// token so repeated signing of the same key yields distinct URLs, matching
/// the freshness contract of real backends.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    issued: AtomicU64,
}

impl MemoryObjectStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects; zero when the internal lock is poisoned.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload<'a>(
        &self,
        container: &str,
        bytes: Vec<u8>,
        destination: &str,
        _content_type: Option<&'a str>,
    ) -> Result<String, ObjectStorageError> {
        let key = format!("{container}/{destination}");
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| ObjectStorageError::backend("memory storage lock poisoned"))?;
        objects.insert(key, bytes);
        Ok(destination.to_owned())
    }

    async fn sign_for_read(
        &self,
        container: &str,
        object_key: &str,
    ) -> Result<String, ObjectStorageError> {
        if object_key.trim().is_empty() {
            return Err(ObjectStorageError::bad_request(
                "object key must not be empty",
            ));
        }
        let token = self.issued.fetch_add(1, Ordering::Relaxed);
        Ok(format!(
            "memory://{container}/{object_key}?token={token}"
        ))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn upload_returns_the_destination_key() {
        let storage = MemoryObjectStorage::new();
        let key = storage
            .upload("exams", vec![1, 2, 3], "courses/algebra/statements/fig.webp", None)
            .await
            .expect("upload succeeds");
        assert_eq!(key, "courses/algebra/statements/fig.webp");
        assert_eq!(storage.object_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_signing_yields_fresh_urls() {
        let storage = MemoryObjectStorage::new();
        let first = storage
            .sign_for_read("exams", "k.webp")
            .await
            .expect("sign succeeds");
        let second = storage
            .sign_for_read("exams", "k.webp")
            .await
            .expect("sign succeeds");
        assert_ne!(first, second, "signed URLs are never reused");
    }

    #[rstest]
    #[tokio::test]
    async fn empty_key_is_a_bad_request() {
        let storage = MemoryObjectStorage::new();
        let err = storage
            .sign_for_read("exams", "  ")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ObjectStorageError::BadRequest { .. }));
    }
}
