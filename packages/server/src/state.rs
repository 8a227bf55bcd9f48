use std::path::PathBuf;
use std::sync::Arc;

use common::storage::s3::{S3ObjectStore, S3Settings};
use common::storage::{FilesystemObjectStore, ObjectStore, StorageError};
use sea_orm::DatabaseConnection;

use crate::audit::AuditLog;
use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::rate_limit::UserRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub object_store: Arc<dyn ObjectStore>,
    pub audit: AuditLog,
    pub rate_limiter: Arc<UserRateLimiter>,
}

/// Construct the configured remote object store.
pub async fn build_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemObjectStore::new(
                PathBuf::from(&config.filesystem.base_path),
                &config.filesystem.public_base_url,
            )
            .await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StorageError::Config("storage.backend is s3 but storage.s3 is not set".into())
            })?;
            let store = S3ObjectStore::new(&S3Settings {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                access_key: s3.access_key.clone(),
                secret_key: s3.secret_key.clone(),
                public_base_url: s3.public_base_url.clone(),
            })?;
            Ok(Arc::new(store))
        }
    }
}
