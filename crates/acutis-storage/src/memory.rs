use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::objects::{GetObjectOutput, content_etag};

/// Process-local store. Clones share the same objects.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub async fn get_object(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        let objects = self.objects.read().await;
        let body = objects.get(key).cloned().ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        let etag = Some(content_etag(&body));
        Ok(GetObjectOutput { body, etag })
    }

    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        if_match: Option<&str>,
    ) -> Result<String, StorageError> {
        let mut objects = self.objects.write().await;
        if let Some(expected) = if_match {
            let current = objects.get(key).map(|b| content_etag(b));
            if current.as_deref() != Some(expected) {
                return Err(StorageError::PreconditionFailed {
                    key: key.to_string(),
                });
            }
        }
        let etag = content_etag(&body);
        objects.insert(key.to_string(), body);
        Ok(etag)
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
