use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Coarse content category passed to the remote store as a placement hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Image,
    Video,
    Raw,
}

impl ResourceCategory {
    /// Derive the category from a MIME type (`image/*`, `video/*`, anything else).
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            Self::Image
        } else if mime_type.starts_with("video/") {
            Self::Video
        } else {
            Self::Raw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of an object after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Durable URL the content can be fetched from.
    pub url: String,
    /// Opaque handle used to address the object for deletion.
    pub object_id: String,
}

/// Remote object store holding uploaded content.
///
/// The store knows nothing about fingerprints or reference counts; callers
/// decide when an object is uploaded and when it is destroyed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the full contents of `reader` and return where it landed.
    async fn upload(
        &self,
        reader: BoxReader,
        category: ResourceCategory,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Delete an object by the identifier returned from [`ObjectStore::upload`].
    async fn destroy(&self, object_id: &str) -> Result<(), StorageError>;
}
