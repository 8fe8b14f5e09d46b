use sha2::{Digest, Sha256};

use crate::error::StorageError;
use crate::fs::FsStore;
use crate::memory::MemoryStore;
use crate::s3::S3Store;

/// Result of a GET operation: the body and its ETag.
#[derive(Debug, Clone)]
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// A key/value object store. Keys are `/`-separated relative paths.
#[derive(Clone, Debug)]
pub enum ObjectStore {
    S3(S3Store),
    Filesystem(FsStore),
    Memory(MemoryStore),
}

impl ObjectStore {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::default())
    }

    pub async fn get_object(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        match self {
            Self::S3(store) => store.get_object(key).await,
            Self::Filesystem(store) => store.get_object(key).await,
            Self::Memory(store) => store.get_object(key).await,
        }
    }

    /// Write an object unconditionally. Returns the new ETag.
    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        match self {
            Self::S3(store) => store.put_object(key, body, content_type, None).await,
            Self::Filesystem(store) => store.put_object(key, body, None).await,
            Self::Memory(store) => store.put_object(key, body, None).await,
        }
    }

    /// Write an object only if its current ETag is `expected_etag`.
    /// Returns the new ETag, or `StorageError::PreconditionFailed`.
    pub async fn put_object_if_match(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        expected_etag: &str,
    ) -> Result<String, StorageError> {
        match self {
            Self::S3(store) => {
                store
                    .put_object(key, body, content_type, Some(expected_etag))
                    .await
            }
            Self::Filesystem(store) => store.put_object(key, body, Some(expected_etag)).await,
            Self::Memory(store) => store.put_object(key, body, Some(expected_etag)).await,
        }
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::S3(store) => store.delete_object(key).await,
            Self::Filesystem(store) => store.delete_object(key).await,
            Self::Memory(store) => store.delete_object(key).await,
        }
    }

    /// List keys under a prefix, sorted.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = match self {
            Self::S3(store) => store.list_objects(prefix).await?,
            Self::Filesystem(store) => store.list_objects(prefix).await?,
            Self::Memory(store) => store.list_objects(prefix).await?,
        };
        keys.sort();
        Ok(keys)
    }
}

/// Content-derived ETag used by the local backends.
pub(crate) fn content_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("\"{hex}\"")
}
