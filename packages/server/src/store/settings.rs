use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::storage::{ObjectStoreConfig, StorageKind};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::entity::settings;
use crate::error::AppError;

/// Key of the single settings row.
const SETTINGS_KEY: &str = "app";

fn default_storage_limit_mb() -> u64 {
    100
}
fn default_max_file_size_mb() -> u64 {
    100
}
fn default_expire_days() -> u32 {
    7
}
fn default_allow_public_uploads() -> bool {
    true
}

/// Runtime-tunable settings, persisted as one JSON document.
///
/// Every field carries a serde default, so documents written by older
/// versions gain new fields transparently on the next read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AppSettings {
    /// Aggregate quota across all live files, in megabytes.
    #[serde(default = "default_storage_limit_mb")]
    pub storage_limit_mb: u64,
    /// Per-file size cap, in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Days until newly uploaded files expire. 0 means never.
    #[serde(default = "default_expire_days")]
    pub default_expire_days: u32,
    /// Backend used for new uploads.
    #[serde(default)]
    pub storage_kind: StorageKind,
    #[serde(default = "default_allow_public_uploads")]
    pub allow_public_uploads: bool,
    /// Object-store connection settings; only consulted when
    /// `storage_kind` is `object_store`.
    #[serde(default)]
    pub oss: ObjectStoreConfig,
    /// Stamped the first time settings are persisted.
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_limit_mb: default_storage_limit_mb(),
            max_file_size_mb: default_max_file_size_mb(),
            default_expire_days: default_expire_days(),
            storage_kind: StorageKind::default(),
            allow_public_uploads: default_allow_public_uploads(),
            oss: ObjectStoreConfig::default(),
            installed_at: None,
        }
    }
}

impl AppSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn storage_limit_bytes(&self) -> u64 {
        self.storage_limit_mb * 1024 * 1024
    }

    /// Apply a partial update. Exactly the fields present in the patch
    /// change; everything else keeps its previous value.
    pub fn merged(mut self, patch: SettingsPatch) -> Self {
        if let Some(v) = patch.storage_limit_mb {
            self.storage_limit_mb = v;
        }
        if let Some(v) = patch.max_file_size_mb {
            self.max_file_size_mb = v;
        }
        if let Some(v) = patch.default_expire_days {
            self.default_expire_days = v;
        }
        if let Some(v) = patch.storage_kind {
            self.storage_kind = v;
        }
        if let Some(v) = patch.allow_public_uploads {
            self.allow_public_uploads = v;
        }
        if let Some(v) = patch.oss {
            self.oss = v;
        }
        self
    }
}

/// Partial settings update; `None` fields keep their previous value.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct SettingsPatch {
    pub storage_limit_mb: Option<u64>,
    pub max_file_size_mb: Option<u64>,
    pub default_expire_days: Option<u32>,
    pub storage_kind: Option<StorageKind>,
    pub allow_public_uploads: Option<bool>,
    pub oss: Option<ObjectStoreConfig>,
}

/// Load/save access to the persisted settings document.
#[derive(Clone)]
pub struct SettingsStore {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SettingsStore {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Read the current settings, falling back to defaults for a missing
    /// row or missing fields.
    pub async fn load(&self) -> Result<AppSettings, AppError> {
        let row = settings::Entity::find_by_id(SETTINGS_KEY.to_string())
            .one(&self.db)
            .await?;

        match row {
            Some(row) => serde_json::from_value(row.data)
                .map_err(|e| AppError::Internal(format!("corrupt settings document: {e}"))),
            None => Ok(AppSettings::default()),
        }
    }

    /// Merge a patch into the current settings and persist the result.
    pub async fn save(&self, patch: SettingsPatch) -> Result<AppSettings, AppError> {
        let mut merged = self.load().await?.merged(patch);
        if merged.installed_at.is_none() {
            merged.installed_at = Some(self.clock.now());
        }

        let data = serde_json::to_value(&merged)
            .map_err(|e| AppError::Internal(format!("failed to serialize settings: {e}")))?;

        let row = settings::ActiveModel {
            key: Set(SETTINGS_KEY.to_string()),
            data: Set(data),
            updated_at: Set(self.clock.now()),
        };

        settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_columns([settings::Column::Data, settings::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(merged)
    }
}
