use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::backends::BackendRegistry;
use crate::clock::Clock;
use crate::entity::file_record;
use crate::error::AppError;
use crate::store::files::FileRecordStore;
use crate::store::settings::{AppSettings, SettingsStore};

/// Background sweep that removes records (and their bytes) once their
/// expiry deadline has passed.
///
/// Safe to run alongside uploads and downloads: it only ever touches
/// records that are already expired, and each record's row is removed as
/// the final step, so an interrupted sweep leaves the record discoverable
/// for the next cycle.
pub struct ExpiryReaper {
    records: FileRecordStore,
    settings: SettingsStore,
    backends: Arc<BackendRegistry>,
    clock: Arc<dyn Clock>,
    scan_interval: Duration,
    startup_delay: Duration,
}

impl ExpiryReaper {
    pub fn new(
        records: FileRecordStore,
        settings: SettingsStore,
        backends: Arc<BackendRegistry>,
        clock: Arc<dyn Clock>,
        scan_interval: Duration,
        startup_delay: Duration,
    ) -> Self {
        Self {
            records,
            settings,
            backends,
            clock,
            scan_interval,
            startup_delay,
        }
    }

    /// Run sweeps until the process exits: one shortly after startup
    /// (delayed so storage and database have settled), then one per
    /// interval.
    pub async fn run(self) {
        info!(
            scan_interval_secs = self.scan_interval.as_secs(),
            startup_delay_secs = self.startup_delay.as_secs(),
            "Starting expiry reaper"
        );

        tokio::time::sleep(self.startup_delay).await;

        let mut interval = tokio::time::interval(self.scan_interval);
        loop {
            interval.tick().await;

            match self.reap_once().await {
                Ok(0) => {}
                Ok(reaped) => info!(reaped, "Expiry sweep complete"),
                Err(e) => error!(error = %e, "Expiry sweep failed"),
            }
        }
    }

    /// Delete every record whose expiry has passed. Returns how many were
    /// removed. Failures are isolated per record; one bad record never
    /// aborts the rest of the sweep.
    pub async fn reap_once(&self) -> Result<usize, AppError> {
        let expired = self.records.list_expired(self.clock.now()).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        info!(count = expired.len(), "Found expired files, cleaning up");
        let settings = self.settings.load().await?;

        let mut reaped = 0;
        for record in expired {
            match self.reap_record(&record, &settings).await {
                Ok(()) => {
                    reaped += 1;
                    info!(
                        code = %record.code,
                        name = %record.name,
                        "Expired file removed"
                    );
                }
                Err(e) => {
                    error!(id = %record.id, error = %e, "Failed to remove expired file");
                }
            }
        }

        Ok(reaped)
    }

    async fn reap_record(
        &self,
        record: &file_record::Model,
        settings: &AppSettings,
    ) -> Result<(), AppError> {
        // Bytes first; a missing file is fine. The row goes last.
        self.backends.delete_bytes(record, settings).await;
        self.records.delete(record.id).await?;

        Ok(())
    }
}
