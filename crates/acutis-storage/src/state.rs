use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;
use crate::objects::ObjectStore;

const JSON: &str = "application/json";

/// Load a JSON state object. Returns the deserialized value and its ETag.
pub async fn load_state<T: DeserializeOwned>(
    store: &ObjectStore,
    key: &str,
) -> Result<(T, String), StorageError> {
    let output = store.get_object(key).await?;
    let value: T = serde_json::from_slice(&output.body)?;
    let etag = output.etag.unwrap_or_default();
    Ok((value, etag))
}

/// Like [`load_state`], but a missing object is `Ok(None)`.
pub async fn load_state_opt<T: DeserializeOwned>(
    store: &ObjectStore,
    key: &str,
) -> Result<Option<(T, String)>, StorageError> {
    match load_state(store, key).await {
        Ok(loaded) => Ok(Some(loaded)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Save a JSON state object. Returns the new ETag.
pub async fn save_state<T: Serialize>(
    store: &ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put_object(key, body, Some(JSON)).await
}

/// Save a JSON state object with ETag optimistic locking.
pub async fn save_state_if_match<T: Serialize>(
    store: &ObjectStore,
    key: &str,
    value: &T,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store
        .put_object_if_match(key, body, Some(JSON), expected_etag)
        .await
}

/// Load every JSON object under a prefix. Objects that fail to parse are
/// skipped with a warning.
pub async fn load_all<T: DeserializeOwned>(
    store: &ObjectStore,
    prefix: &str,
) -> Result<Vec<(T, String)>, StorageError> {
    let keys = store.list_objects(prefix).await?;
    let mut loaded = Vec::with_capacity(keys.len());
    for key in &keys {
        match load_state(store, key).await {
            Ok(item) => loaded.push(item),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!(key = %key, error = %e, "skipping unreadable object");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(loaded)
}
