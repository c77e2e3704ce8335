use std::sync::Arc;

use common::RetrievalCode;
use uuid::Uuid;

use crate::clock::Clock;
use crate::entity::file_record;
use crate::error::AppError;
use crate::store::files::FileRecordStore;

/// Resolves retrieval codes for receivers and accounts downloads.
#[derive(Clone)]
pub struct DownloadService {
    records: FileRecordStore,
    clock: Arc<dyn Clock>,
}

impl DownloadService {
    pub fn new(records: FileRecordStore, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Look up a record by retrieval code for download.
    ///
    /// A record past its expiry is reported as `Expired` (not `NotFound`)
    /// even when the reaper has not physically removed it yet.
    pub async fn resolve(&self, code: &str) -> Result<file_record::Model, AppError> {
        let code =
            RetrievalCode::parse(code).map_err(|e| AppError::Validation(e.to_string()))?;

        let record = self
            .records
            .find_by_code(code.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))?;

        if record.expire_at.is_some_and(|at| at <= self.clock.now()) {
            return Err(AppError::Expired);
        }

        Ok(record)
    }

    /// Atomically bump the download counter and return the updated record.
    pub async fn record_download(&self, id: Uuid) -> Result<file_record::Model, AppError> {
        self.records
            .increment_download_count(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))
    }
}
