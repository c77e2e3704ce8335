use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::path::validate_storage_name;
use super::traits::{DownloadSource, StorageBackend, StoredObject};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl ObjectStoreConfig {
    /// Whether enough is configured to talk to a bucket at all.
    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty()
            && !self.bucket.is_empty()
            && !self.access_key_id.is_empty()
            && !self.access_key_secret.is_empty()
    }
}

/// S3-compatible object storage (MinIO, Aliyun OSS, AWS, ...).
///
/// Uses path-style URLs so plain `http://endpoint/bucket` deployments work.
/// Downloads are served as redirects to presigned GET URLs rather than
/// proxied through this process.
pub struct ObjectStorage {
    bucket: Box<Bucket>,
    endpoint: String,
    max_size: u64,
    presign_expiry_secs: u32,
}

impl ObjectStorage {
    /// Build a client from settings. Fails with
    /// [`StorageError::Configuration`] when endpoint, bucket or
    /// credentials are missing, so a misconfigured deployment is caught
    /// before any upload is attempted.
    pub fn new(
        config: &ObjectStoreConfig,
        max_size: u64,
        presign_expiry_secs: u32,
    ) -> Result<Self, StorageError> {
        if !config.is_complete() {
            return Err(StorageError::Configuration(
                "object storage requires endpoint, bucket and credentials".into(),
            ));
        }

        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.access_key_secret),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Configuration(format!("invalid credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Configuration(format!("invalid bucket config: {e}")))?;
        bucket.set_path_style();

        Ok(Self {
            bucket,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_size,
            presign_expiry_secs,
        })
    }

    /// Stable path-style URL for a stored object.
    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket.name(), key)
    }
}

#[async_trait]
impl StorageBackend for ObjectStorage {
    async fn put(&self, path_hint: &str, data: &[u8]) -> Result<StoredObject, StorageError> {
        let key = validate_storage_name(path_hint)?;

        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let response = self
            .bucket
            .put_object(key, data)
            .await
            .map_err(|e| StorageError::Backend(format!("put failed: {e}")))?;

        if response.status_code() != 200 {
            return Err(StorageError::Backend(format!(
                "put returned HTTP {}",
                response.status_code()
            )));
        }

        Ok(StoredObject {
            url: self.object_url(key),
            storage_path: key.to_string(),
        })
    }

    async fn delete(&self, storage_path: &str) -> Result<bool, StorageError> {
        let key = validate_storage_name(storage_path)?;

        // S3 deletes are already idempotent: removing a missing key
        // returns 204 just like removing an existing one.
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("delete failed: {e}")))?;

        match response.status_code() {
            200 | 204 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "delete returned HTTP {status}"
            ))),
        }
    }

    async fn resolve_download(&self, storage_path: &str) -> Result<DownloadSource, StorageError> {
        let key = validate_storage_name(storage_path)?;

        let url = self
            .bucket
            .presign_get(key, self.presign_expiry_secs, None)
            .await
            .map_err(|e| StorageError::Backend(format!("presign failed: {e}")))?;

        Ok(DownloadSource::Redirect(url))
    }
}
