use async_trait::async_trait;
use ::s3::creds::Credentials;
use ::s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::{BoxReader, ObjectStore, ResourceCategory, StoredObject};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL objects are publicly reachable under, e.g. a CDN origin.
    pub public_base_url: String,
}

/// Object store backed by an S3-compatible bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(e.to_string()))?;

        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint.clone(),
        };

        let bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_base_url: settings.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        mut reader: BoxReader,
        category: ResourceCategory,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let object_id = format!("{category}/{}", uuid::Uuid::now_v7());

        let response = self
            .bucket
            .put_object_stream_with_content_type(&mut reader, &object_id, content_type)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Upload(format!(
                "bucket returned status {status}"
            )));
        }

        Ok(StoredObject {
            url: format!("{}/{object_id}", self.public_base_url),
            object_id,
        })
    }

    async fn destroy(&self, object_id: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .delete_object(object_id)
            .await
            .map_err(|e| StorageError::Destroy(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(()),
            404 => Err(StorageError::NotFound(object_id.to_string())),
            status => Err(StorageError::Destroy(format!(
                "bucket returned status {status}"
            ))),
        }
    }
}
