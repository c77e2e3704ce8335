mod error;
mod path;
mod traits;

pub mod local;
#[cfg(feature = "object-storage")]
pub mod object;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::StorageError;
pub use local::LocalDiskStorage;
#[cfg(feature = "object-storage")]
pub use object::{ObjectStorage, ObjectStoreConfig};
pub use path::validate_storage_name;
pub use traits::{BoxReader, DownloadSource, StorageBackend, StoredObject};

/// Which backend variant holds a file's bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    LocalDisk,
    ObjectStore,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalDisk => "local_disk",
            Self::ObjectStore => "object_store",
        }
    }

    /// Parse the stored string form. Returns `None` for unknown values so
    /// callers decide how to treat rows written by a newer version.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local_disk" => Some(Self::LocalDisk),
            "object_store" => Some(Self::ObjectStore),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
