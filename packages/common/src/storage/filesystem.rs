use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::name::validate_blob_name;
use super::traits::{BlobHandle, BlobStore};

/// Filesystem-backed blob store.
///
/// Blobs live directly under `base_path`, one file per name. Writes go
/// through `{base_path}/.tmp` and are published with a hard link, so a blob
/// is either absent or complete and an existing name is never replaced.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the directory if needed.
    ///
    /// Anything left in `.tmp` by a previous process is removed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        let temp_dir = base_path.join(".tmp");
        fs::create_dir_all(&temp_dir).await?;

        let stale = clear_dir(&temp_dir).await?;
        if stale > 0 {
            tracing::info!(count = stale, "Removed stale temp files");
        }

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn checked_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_blob_name(name).map_err(|reason| StorageError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        Ok(self.base_path.join(name))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// A temp file path that is unlinked on drop.
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Write `data` to the temp file, then hard-link it to `blob_path`.
///
/// Runs on the blocking pool as one unit, so the temp file is removed even
/// when the caller stops waiting.
fn publish(temp: TempFile, blob_path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(&temp.0)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    // hard_link fails atomically when the target exists.
    std::fs::hard_link(&temp.0, blob_path)
}

async fn clear_dir(dir: &Path) -> Result<usize, StorageError> {
    let mut removed = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
        removed += 1;
    }
    Ok(removed)
}

fn not_found_or(err: std::io::Error, name: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn path_for(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    async fn store(&self, name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let blob_path = self.checked_path(name)?;

        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let temp = TempFile(self.temp_path());
        let target = blob_path.clone();
        let data = data.to_vec();
        let linked = tokio::task::spawn_blocking(move || publish(temp, &target, &data))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;

        match linked {
            Ok(()) => Ok(blob_path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<PathBuf, StorageError> {
        let old_path = self.checked_path(old_name)?;
        let new_path = self.checked_path(new_name)?;

        if old_name == new_name {
            return match fs::try_exists(&old_path).await? {
                true => Ok(new_path),
                false => Err(StorageError::NotFound(old_name.to_string())),
            };
        }

        // rename(2) silently replaces the target, so check first. Not atomic
        // with the rename itself; concurrent renames onto one name can race.
        if fs::try_exists(&new_path).await? {
            return Err(StorageError::AlreadyExists(new_name.to_string()));
        }

        fs::rename(&old_path, &new_path)
            .await
            .map_err(|e| not_found_or(e, old_name))?;

        Ok(new_path)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let blob_path = self.checked_path(name)?;
        fs::remove_file(&blob_path)
            .await
            .map_err(|e| not_found_or(e, name))
    }

    async fn retrieve(&self, name: &str) -> Result<BlobHandle, StorageError> {
        let blob_path = self.checked_path(name)?;
        let file = fs::File::open(&blob_path)
            .await
            .map_err(|e| not_found_or(e, name))?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(BlobHandle {
            reader: Box::new(BufReader::new(file)),
            size: meta.len(),
        })
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let blob_path = self.checked_path(name)?;
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "Skipping non-UTF-8 blob name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}
