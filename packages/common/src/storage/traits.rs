use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An open blob ready to be streamed out.
pub struct BlobHandle {
    pub reader: BoxReader,
    /// Size in bytes at open time.
    pub size: u64,
}

/// Blob storage keyed by logical name.
///
/// Implementations never overwrite an existing blob; callers are expected to
/// generate collision-resistant names.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolved location for `name`, whether or not it exists.
    fn path_for(&self, name: &str) -> PathBuf;

    /// Store bytes under `name` and return the resolved path.
    async fn store(&self, name: &str, data: &[u8]) -> Result<PathBuf, StorageError>;

    /// Rename a blob in place and return its new path.
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<PathBuf, StorageError>;

    /// Delete a blob by name.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Open a blob for streaming.
    async fn retrieve(&self, name: &str) -> Result<BlobHandle, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut handle = self.retrieve(name).await?;
        let mut buf = Vec::with_capacity(handle.size as usize);
        handle.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Names of every stored blob, sorted.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}
