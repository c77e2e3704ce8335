use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Original upload filename. Metadata only; never part of a storage
    /// path.
    pub name: String,

    /// Size of the file in bytes.
    pub size: i64,

    /// MIME content type.
    pub mime_type: String,

    /// SHA-256 content hash (hex). Deduplication lookup key.
    pub content_hash: String,

    pub uploaded_at: DateTimeUtc,

    /// 6-character retrieval code. Stored uppercase, matched
    /// case-insensitively; unique among live records.
    #[sea_orm(unique)]
    pub code: String,

    /// Resolved access URL for the stored bytes.
    pub data_url: String,

    /// Which backend holds the bytes: "local_disk" or "object_store".
    pub storage_kind: String,

    /// Backend locator: flat filename on disk or object key.
    pub storage_path: String,

    /// Incremented only by the download accounting path.
    pub download_count: i64,

    /// NULL means the record never expires.
    pub expire_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
