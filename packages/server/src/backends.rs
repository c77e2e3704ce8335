use std::sync::Arc;

use common::storage::{LocalDiskStorage, ObjectStorage, StorageBackend, StorageKind};
use tracing::{debug, warn};

use crate::entity::file_record;
use crate::error::AppError;
use crate::store::settings::AppSettings;

/// The storage backends available to this process.
///
/// The local backend is constructed once at startup. The object backend
/// is rebuilt from the current settings on demand (construction is pure
/// struct assembly, no I/O), so credential changes take effect without a
/// restart.
pub struct BackendRegistry {
    local: Arc<LocalDiskStorage>,
    max_object_size: u64,
    presign_expiry_secs: u32,
}

impl BackendRegistry {
    pub fn new(
        local: Arc<LocalDiskStorage>,
        max_object_size: u64,
        presign_expiry_secs: u32,
    ) -> Self {
        Self {
            local,
            max_object_size,
            presign_expiry_secs,
        }
    }

    pub fn local(&self) -> Arc<LocalDiskStorage> {
        self.local.clone()
    }

    /// Resolve the backend for `kind`. Selecting the object store without
    /// complete credentials fails with a configuration error.
    pub fn resolve(
        &self,
        kind: StorageKind,
        settings: &AppSettings,
    ) -> Result<Arc<dyn StorageBackend>, AppError> {
        match kind {
            StorageKind::LocalDisk => Ok(self.local.clone()),
            StorageKind::ObjectStore => {
                let storage = ObjectStorage::new(
                    &settings.oss,
                    self.max_object_size,
                    self.presign_expiry_secs,
                )?;
                Ok(Arc::new(storage))
            }
        }
    }

    /// Best-effort removal of a record's stored bytes.
    ///
    /// Missing objects, unknown storage kinds and backend failures are
    /// logged, never raised: an orphaned blob is a benign leak, while
    /// failing the caller here would block record deletion.
    pub async fn delete_bytes(&self, record: &file_record::Model, settings: &AppSettings) {
        let Some(kind) = StorageKind::parse(&record.storage_kind) else {
            warn!(
                id = %record.id,
                storage_kind = %record.storage_kind,
                "unknown storage kind, leaving bytes in place"
            );
            return;
        };

        let backend = match self.resolve(kind, settings) {
            Ok(backend) => backend,
            Err(e) => {
                warn!(
                    id = %record.id,
                    error = %e,
                    "could not resolve storage backend for byte deletion"
                );
                return;
            }
        };

        match backend.delete(&record.storage_path).await {
            Ok(true) => debug!(storage_path = %record.storage_path, "deleted stored bytes"),
            Ok(false) => {
                debug!(storage_path = %record.storage_path, "stored bytes already gone")
            }
            Err(e) => warn!(
                storage_path = %record.storage_path,
                error = %e,
                "failed to delete stored bytes"
            ),
        }
    }
}
