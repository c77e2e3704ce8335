use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding locally stored uploads.
    pub upload_dir: PathBuf,
    /// Hard cap on uploaded bodies, in bytes. The per-file limit from the
    /// runtime settings is enforced on top of this.
    pub max_body_size: u64,
    /// Lifetime of presigned object-store download URLs, in seconds.
    pub presign_expiry_secs: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReaperConfig {
    /// Seconds between expiry sweeps.
    pub scan_interval_secs: u64,
    /// Delay before the first sweep, so storage and database are up.
    pub startup_delay_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub reaper: ReaperConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://data/files.db?mode=rwc")?
            .set_default("storage.upload_dir", "./uploadfiles")?
            .set_default("storage.max_body_size", 1024 * 1024 * 1024)?
            .set_default("storage.presign_expiry_secs", 3600)?
            .set_default("reaper.scan_interval_secs", 3600)?
            .set_default("reaper.startup_delay_secs", 5)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FILEDROP__DATABASE__URL)
            .add_source(Environment::with_prefix("FILEDROP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
