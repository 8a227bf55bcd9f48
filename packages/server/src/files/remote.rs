//! Time-bounded calls into the remote object store.

use std::time::Duration;

use common::storage::{BoxReader, ObjectStore, ResourceCategory, StorageError, StoredObject};

pub async fn upload(
    store: &dyn ObjectStore,
    timeout: Duration,
    reader: BoxReader,
    category: ResourceCategory,
    content_type: &str,
) -> Result<StoredObject, StorageError> {
    match tokio::time::timeout(timeout, store.upload(reader, category, content_type)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Upload(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

pub async fn destroy(
    store: &dyn ObjectStore,
    timeout: Duration,
    object_id: &str,
) -> Result<(), StorageError> {
    match tokio::time::timeout(timeout, store.destroy(object_id)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Destroy(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
