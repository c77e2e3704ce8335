use std::sync::Arc;
use std::time::Duration;

use common::storage::LocalDiskStorage;
use sea_orm::DatabaseConnection;

use crate::backends::BackendRegistry;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::services::download::DownloadService;
use crate::services::reaper::ExpiryReaper;
use crate::services::upload::UploadService;
use crate::store::files::FileRecordStore;
use crate::store::settings::SettingsStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub records: FileRecordStore,
    pub settings: SettingsStore,
    pub backends: Arc<BackendRegistry>,
    pub uploads: UploadService,
    pub downloads: DownloadService,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the full service graph. Used by `main` and the test harness.
    pub async fn build(
        config: AppConfig,
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let local = LocalDiskStorage::new(
            config.storage.upload_dir.clone(),
            config.storage.max_body_size,
        )
        .await?;

        let backends = Arc::new(BackendRegistry::new(
            Arc::new(local),
            config.storage.max_body_size,
            config.storage.presign_expiry_secs,
        ));

        let records = FileRecordStore::new(db.clone());
        let settings = SettingsStore::new(db.clone(), clock.clone());
        let uploads = UploadService::new(
            records.clone(),
            settings.clone(),
            backends.clone(),
            clock.clone(),
        );
        let downloads = DownloadService::new(records.clone(), clock.clone());

        Ok(Self {
            db,
            config,
            records,
            settings,
            backends,
            uploads,
            downloads,
            clock,
        })
    }

    /// Build the expiry reaper for this state. The caller decides where it
    /// runs (spawned from `main`, driven directly in tests).
    pub fn expiry_reaper(&self) -> ExpiryReaper {
        ExpiryReaper::new(
            self.records.clone(),
            self.settings.clone(),
            self.backends.clone(),
            self.clock.clone(),
            Duration::from_secs(self.config.reaper.scan_interval_secs),
            Duration::from_secs(self.config.reaper.startup_delay_secs),
        )
    }
}
