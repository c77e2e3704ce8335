use chrono::{DateTime, Utc};
use common::ContentHash;
use sea_orm::sea_query::{Expr, ExprTrait as _};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, SqlErr,
};
use uuid::Uuid;

use crate::entity::file_record;
use crate::error::AppError;

/// Durable index of file metadata.
///
/// Every mutation is a single statement, so the database's own atomicity
/// is the only synchronization: concurrent inserts racing on the same
/// code are resolved by the unique index, and concurrent download-count
/// bumps never lose updates.
#[derive(Clone)]
pub struct FileRecordStore {
    db: DatabaseConnection,
}

impl FileRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new record. A unique-constraint violation on `code` is
    /// reported as [`AppError::DuplicateCode`] so the caller can retry
    /// with a freshly generated code; other write failures pass through
    /// unchanged.
    pub async fn insert(&self, record: file_record::Model) -> Result<file_record::Model, AppError> {
        let active = record.clone().into_active_model();

        match file_record::Entity::insert(active)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(record),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::DuplicateCode),
                _ => Err(e.into()),
            },
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<file_record::Model>, AppError> {
        Ok(file_record::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Case-insensitive code lookup. Codes are stored uppercase, so
    /// normalizing the query suffices.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::Code.eq(code.to_ascii_uppercase()))
            .one(&self.db)
            .await?)
    }

    pub async fn find_by_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::ContentHash.eq(hash.to_hex()))
            .one(&self.db)
            .await?)
    }

    /// The dedup lookup: the newest record with this hash whose expiry
    /// has not passed. Expired rows awaiting the reaper never shadow a
    /// live one.
    pub async fn find_live_by_hash(
        &self,
        hash: &ContentHash,
        now: DateTime<Utc>,
    ) -> Result<Option<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::ContentHash.eq(hash.to_hex()))
            .filter(
                file_record::Column::ExpireAt
                    .is_null()
                    .or(file_record::Column::ExpireAt.gt(now)),
            )
            .order_by_desc(file_record::Column::UploadedAt)
            .one(&self.db)
            .await?)
    }

    pub async fn find_by_storage_path(
        &self,
        storage_path: &str,
    ) -> Result<Option<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::StoragePath.eq(storage_path))
            .one(&self.db)
            .await?)
    }

    /// All records, newest first.
    pub async fn list_all(&self) -> Result<Vec<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .order_by_desc(file_record::Column::UploadedAt)
            .all(&self.db)
            .await?)
    }

    /// Records whose expiry deadline has passed.
    pub async fn list_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<file_record::Model>, AppError> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::ExpireAt.is_not_null())
            .filter(file_record::Column::ExpireAt.lte(now))
            .all(&self.db)
            .await?)
    }

    /// Sum of sizes over every record, for the aggregate quota check.
    /// Expired rows count until the reaper removes them; their bytes are
    /// still on disk.
    pub async fn total_stored_size(&self) -> Result<u64, AppError> {
        let sizes: Vec<i64> = file_record::Entity::find()
            .select_only()
            .column(file_record::Column::Size)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(sizes.into_iter().map(|s| Ord::max(s, 0) as u64).sum())
    }

    /// Bump `download_count` with a single atomic UPDATE and return the
    /// updated record, or `None` if the record does not exist.
    pub async fn increment_download_count(
        &self,
        id: Uuid,
    ) -> Result<Option<file_record::Model>, AppError> {
        let result = file_record::Entity::update_many()
            .col_expr(
                file_record::Column::DownloadCount,
                Expr::col(file_record::Column::DownloadCount).add(1),
            )
            .filter(file_record::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Delete a record row. Returns `false` if no row matched.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = file_record::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
