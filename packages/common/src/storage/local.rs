use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::path::validate_storage_name;
use super::traits::{DownloadSource, StorageBackend, StoredObject};

/// Disk-backed storage under a single sandboxed directory.
///
/// Objects are flat files named by the caller-provided hint; writes go
/// through a temp file in `{root}/.tmp` and an atomic rename so a crashed
/// upload never leaves a partial object behind.
pub struct LocalDiskStorage {
    root: PathBuf,
    max_size: u64,
}

impl LocalDiskStorage {
    /// Create a local store rooted at `root`, creating the directory
    /// layout if needed.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl StorageBackend for LocalDiskStorage {
    async fn put(&self, path_hint: &str, data: &[u8]) -> Result<StoredObject, StorageError> {
        let name = validate_storage_name(path_hint)?;

        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let target = self.object_path(name);
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredObject {
            url: format!("/uploadfiles/{name}"),
            storage_path: name.to_string(),
        })
    }

    async fn delete(&self, storage_path: &str) -> Result<bool, StorageError> {
        let name = validate_storage_name(storage_path)?;
        match fs::remove_file(self.object_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_download(&self, storage_path: &str) -> Result<DownloadSource, StorageError> {
        let name = validate_storage_name(storage_path)?;
        match fs::File::open(self.object_path(name)).await {
            Ok(file) => Ok(DownloadSource::Stream(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
