use std::fmt;

/// Errors that can occur during content hashing or remote object operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested object was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The provided content hash is invalid.
    InvalidHash(String),
    /// The object identifier is malformed or escapes the store's namespace.
    InvalidObjectId(String),
    /// The remote store refused or failed an upload.
    Upload(String),
    /// The remote store refused or failed a deletion.
    Destroy(String),
    /// The backend could not be configured.
    Config(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "object not found: {id}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::InvalidObjectId(id) => write!(f, "invalid object id: {id}"),
            Self::Upload(msg) => write!(f, "remote upload failed: {msg}"),
            Self::Destroy(msg) => write!(f, "remote destroy failed: {msg}"),
            Self::Config(msg) => write!(f, "object store configuration error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
