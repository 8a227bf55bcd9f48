use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::StorageError;
use super::traits::{BoxReader, ObjectStore, ResourceCategory, StoredObject};

/// Filesystem-backed object store.
///
/// Objects are written to `{base_path}/{category}/{uuid}[.ext]` and served
/// by the HTTP layer under `public_base_url`. The object id is the path
/// relative to `base_path`.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(base_path: PathBuf, public_base_url: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn object_path(&self, object_id: &str) -> Result<PathBuf, StorageError> {
        validate_object_id(object_id)?;
        Ok(self.base_path.join(object_id))
    }
}

/// Object ids look like `raw/0192f...` with an optional extension.
fn validate_object_id(object_id: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidObjectId(object_id.to_string());

    let (category, name) = object_id.split_once('/').ok_or_else(invalid)?;
    if !matches!(category, "image" | "video" | "raw") {
        return Err(invalid());
    }
    if name.is_empty()
        || name.starts_with('.')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Pick a file extension so static serving yields a sensible content type.
fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    mime_guess::get_mime_extensions_str(essence)
        .and_then(|exts| exts.first().copied())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn upload(
        &self,
        mut reader: BoxReader,
        category: ResourceCategory,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let temp_path = self.temp_path();

        let written = async {
            let mut temp_file = fs::File::create(&temp_path).await?;
            tokio::io::copy(&mut reader, &mut temp_file).await?;
            temp_file.flush().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Upload(e.to_string()));
        }

        let name = match extension_for(content_type) {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::now_v7()),
            None => uuid::Uuid::now_v7().to_string(),
        };
        let object_id = format!("{category}/{name}");
        let object_path = self.base_path.join(&object_id);

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Upload(e.to_string()));
        }

        Ok(StoredObject {
            url: format!("{}/{object_id}", self.public_base_url),
            object_id,
        })
    }

    async fn destroy(&self, object_id: &str) -> Result<(), StorageError> {
        let path = self.object_path(object_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(object_id.to_string()))
            }
            Err(e) => Err(StorageError::Destroy(e.to_string())),
        }
    }
}
