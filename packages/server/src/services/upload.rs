use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use chrono::{DateTime, Duration, Utc};
use common::storage::StorageBackend;
use common::{ContentHash, RetrievalCode};
use tracing::{info, warn};
use uuid::Uuid;

use crate::backends::BackendRegistry;
use crate::clock::Clock;
use crate::entity::file_record;
use crate::error::AppError;
use crate::store::files::FileRecordStore;
use crate::store::settings::SettingsStore;

/// Insert attempts before giving up on finding a free retrieval code.
/// 32^6 combinations make more than one collision in a row vanishingly
/// unlikely.
const CODE_INSERT_ATTEMPTS: usize = 5;

/// A file as received from the client, before any policy checks.
pub struct NewUpload {
    pub data: Bytes,
    pub original_name: String,
    pub declared_mime: Option<String>,
}

/// Coordinates the upload pipeline: policy checks, content dedup, byte
/// storage, code allocation and record insertion, in that order.
///
/// Bytes are always stored before the record is inserted; when a later
/// step fails, the stored bytes are deleted again best-effort. The
/// failure mode this avoids is a record pointing at bytes that never
/// landed.
#[derive(Clone)]
pub struct UploadService {
    records: FileRecordStore,
    settings: SettingsStore,
    backends: Arc<BackendRegistry>,
    clock: Arc<dyn Clock>,
}

impl UploadService {
    pub fn new(
        records: FileRecordStore,
        settings: SettingsStore,
        backends: Arc<BackendRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records,
            settings,
            backends,
            clock,
        }
    }

    pub async fn upload(&self, upload: NewUpload) -> Result<file_record::Model, AppError> {
        let settings = self.settings.load().await?;

        if !settings.allow_public_uploads {
            return Err(AppError::UploadsDisabled);
        }

        // The actual received size, regardless of what any header claimed.
        let size = upload.data.len() as u64;
        if size > settings.max_file_size_bytes() {
            return Err(AppError::FileTooLarge {
                limit_mb: settings.max_file_size_mb,
            });
        }

        let used = self.records.total_stored_size().await?;
        if used + size > settings.storage_limit_bytes() {
            return Err(AppError::QuotaExceeded {
                limit_mb: settings.storage_limit_mb,
            });
        }

        let hash = ContentHash::compute(&upload.data);

        // Identical content is served from the existing record: same code,
        // same id, no second copy of the bytes.
        if let Some(existing) = self
            .records
            .find_live_by_hash(&hash, self.clock.now())
            .await?
        {
            info!(code = %existing.code, "duplicate content, reusing existing record");
            return Ok(existing);
        }

        let now = self.clock.now();
        let code = RetrievalCode::generate();
        let path_hint = storage_path_hint(&code, now, &upload.original_name);

        let backend = self.backends.resolve(settings.storage_kind, &settings)?;
        let stored = backend.put(&path_hint, &upload.data).await?;

        let expire_at = (settings.default_expire_days > 0)
            .then(|| now + Duration::days(i64::from(settings.default_expire_days)));

        let mut record = file_record::Model {
            id: Uuid::now_v7(),
            name: upload.original_name.clone(),
            size: size as i64,
            mime_type: resolve_mime(upload.declared_mime, &upload.original_name),
            content_hash: hash.to_hex(),
            uploaded_at: now,
            code: code.as_str().to_string(),
            data_url: stored.url.clone(),
            storage_kind: settings.storage_kind.as_str().to_string(),
            storage_path: stored.storage_path.clone(),
            download_count: 0,
            expire_at,
        };

        for attempt in 1..=CODE_INSERT_ATTEMPTS {
            match self.records.insert(record.clone()).await {
                Ok(saved) => {
                    info!(
                        code = %saved.code,
                        name = %saved.name,
                        size = saved.size,
                        "file uploaded"
                    );
                    return Ok(saved);
                }
                Err(AppError::DuplicateCode) => {
                    warn!(attempt, "retrieval code collision, regenerating");
                    record.code = RetrievalCode::generate().as_str().to_string();
                }
                Err(e) => {
                    self.cleanup_stored_bytes(&*backend, &stored.storage_path)
                        .await;
                    return Err(e);
                }
            }
        }

        self.cleanup_stored_bytes(&*backend, &stored.storage_path)
            .await;
        Err(AppError::DuplicateCode)
    }

    /// Compensating delete after a failed insert. Best effort: a cleanup
    /// failure is logged, never re-raised over the original error.
    async fn cleanup_stored_bytes(&self, backend: &dyn StorageBackend, storage_path: &str) {
        if let Err(e) = backend.delete(storage_path).await {
            warn!(
                storage_path,
                error = %e,
                "failed to clean up stored bytes after aborted upload"
            );
        }
    }
}

/// Backend-chosen storage name: `{code}_{timestamp_ms}.{ext}`.
///
/// The original filename never reaches the storage layer; only its
/// extension survives, and only when it is plain ASCII alphanumeric.
fn storage_path_hint(code: &RetrievalCode, now: DateTime<Utc>, original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    format!("{}_{}.{}", code, now.timestamp_millis(), ext)
}

/// Client-declared MIME type, falling back to a guess from the filename.
fn resolve_mime(declared: Option<String>, original_name: &str) -> String {
    declared
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            mime_guess::from_path(original_name)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
