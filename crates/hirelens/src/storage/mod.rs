//! Blob storage for uploaded resumes and rendered reports.
//!
//! The pipeline only sees opaque string references; where the bytes live is
//! up to the [`BlobStore`] implementation.

pub mod filesystem;

pub use filesystem::FileBlobStore;

use crate::error::StorageError;

pub trait BlobStore: Send + Sync {
    /// Reads the bytes behind a reference returned by [`BlobStore::write`].
    fn read(&self, blob_ref: &str) -> Result<Vec<u8>, StorageError>;

    /// Stores `bytes` under `prefix` with a name derived from `name` and
    /// returns the reference. Never overwrites an existing blob.
    fn write(&self, prefix: &str, name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Removes a blob. A reference that no longer exists is not an error.
    fn delete(&self, blob_ref: &str) -> Result<(), StorageError>;
}
