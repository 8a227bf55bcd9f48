mod error;
mod hash;
mod traits;

pub mod filesystem;
pub mod mime;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use filesystem::FilesystemObjectStore;
pub use hash::{ContentHash, hash_reader};
pub use traits::{BoxReader, ObjectStore, ResourceCategory, StoredObject};
