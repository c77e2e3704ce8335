use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Where a stored object ended up, as returned by [`StorageBackend::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Resolvable access URL for the bytes.
    pub url: String,
    /// Backend-internal locator, used later to stream or delete the bytes.
    pub storage_path: String,
}

/// How a download is handed to the client.
pub enum DownloadSource {
    /// Bytes streamed directly from the backend.
    Stream(BoxReader),
    /// The client is redirected to this URL (e.g. a presigned object URL).
    Redirect(String),
}

/// Raw byte storage keyed by backend-chosen paths.
///
/// Implementations own a sandboxed root (directory or bucket prefix); any
/// path that would escape it is rejected with
/// [`StorageError::PathDenied`], never resolved.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under a name derived from `path_hint` and return the
    /// access URL plus the locator for later deletes and reads. Writes
    /// either complete fully or leave nothing behind; oversized data is
    /// rejected with [`StorageError::SizeLimitExceeded`].
    async fn put(&self, path_hint: &str, data: &[u8]) -> Result<StoredObject, StorageError>;

    /// Delete the object at `storage_path`.
    ///
    /// Idempotent: returns `true` if the object was deleted, `false` if it
    /// did not exist. Missing objects are not an error.
    async fn delete(&self, storage_path: &str) -> Result<bool, StorageError>;

    /// Resolve an object for download, as a byte stream or a redirect URL.
    async fn resolve_download(&self, storage_path: &str) -> Result<DownloadSource, StorageError>;
}
