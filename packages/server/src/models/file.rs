use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::file_record;

/// Response DTO for a single file record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    /// Record ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Retrieval code the receiver types in.
    #[schema(example = "AB2C3D")]
    pub code: String,
    /// Original upload filename.
    #[schema(example = "report.pdf")]
    pub name: String,
    /// File size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    /// MIME content type.
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// SHA-256 content hash, usable to verify integrity after download.
    #[schema(example = "a1b2c3d4e5f6...")]
    pub hash: String,
    /// Access URL for the stored bytes.
    #[schema(example = "/uploadfiles/AB2C3D_1717243200000.pdf")]
    pub url: String,
    /// Backend holding the bytes.
    #[schema(example = "local_disk")]
    pub storage_kind: String,
    pub download_count: i64,
    pub uploaded_at: DateTime<Utc>,
    /// Absent when the file never expires.
    pub expire_at: Option<DateTime<Utc>>,
}

impl From<file_record::Model> for FileResponse {
    fn from(model: file_record::Model) -> Self {
        Self {
            id: model.id.to_string(),
            code: model.code,
            name: model.name,
            size: model.size,
            mime_type: model.mime_type,
            hash: model.content_hash,
            url: model.data_url,
            storage_kind: model.storage_kind,
            download_count: model.download_count,
            uploaded_at: model.uploaded_at,
            expire_at: model.expire_at,
        }
    }
}

/// Response DTO for listing file records.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

/// Response DTO for a successful delete.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
