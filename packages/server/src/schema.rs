use sea_orm::sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::entity::file_record;

/// Ensure required database indexes exist.
///
/// The unique index on `code` is the constraint that makes retrieval
/// codes collision-safe under concurrent uploads, so its creation is
/// fatal on failure. The `expire_at` index only speeds up reaper scans.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let unique_code = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_file_record_code")
        .table(file_record::Entity)
        .col(file_record::Column::Code)
        .to_owned();

    db.execute_unprepared(&build_sql(db.get_database_backend(), &unique_code))
        .await?;
    info!("Ensured unique index idx_file_record_code exists");

    let expire_at = Index::create()
        .if_not_exists()
        .name("idx_file_record_expire_at")
        .table(file_record::Entity)
        .col(file_record::Column::ExpireAt)
        .to_owned();

    match db
        .execute_unprepared(&build_sql(db.get_database_backend(), &expire_at))
        .await
    {
        Ok(_) => info!("Ensured index idx_file_record_expire_at exists"),
        Err(e) => {
            tracing::warn!("Failed to create index idx_file_record_expire_at: {}", e);
        }
    }

    Ok(())
}

fn build_sql(backend: DbBackend, stmt: &IndexCreateStatement) -> String {
    if backend == DbBackend::Sqlite {
        stmt.to_string(SqliteQueryBuilder)
    } else if backend == DbBackend::MySql {
        stmt.to_string(MysqlQueryBuilder)
    } else {
        stmt.to_string(PostgresQueryBuilder)
    }
}
