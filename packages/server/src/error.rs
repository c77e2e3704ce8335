use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `FILE_TOO_LARGE`, `QUOTA_EXCEEDED`, `UPLOADS_DISABLED`,
    /// `PATH_DENIED`, `NOT_FOUND`, `EXPIRED`, `CONFIGURATION_ERROR`,
    /// `STORAGE_FAILURE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Missing 'file' field")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The file exceeds the per-file size limit. Contains the limit in MB.
    FileTooLarge {
        limit_mb: u64,
    },
    /// The upload would exceed the aggregate storage quota.
    QuotaExceeded {
        limit_mb: u64,
    },
    UploadsDisabled,
    /// A storage path escaped the managed root.
    PathDenied,
    NotFound(String),
    /// The record exists but its expiry has passed.
    Expired,
    /// A retrieval code collided with an existing record. Recovered by
    /// regenerating the code; only surfaced if retries run out.
    DuplicateCode,
    Configuration(String),
    Storage(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::FileTooLarge { limit_mb } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "FILE_TOO_LARGE",
                    message: format!("File exceeds the maximum allowed size of {limit_mb}MB"),
                },
            ),
            AppError::QuotaExceeded { limit_mb } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "QUOTA_EXCEEDED",
                    message: format!("Not enough storage space. The limit is {limit_mb}MB"),
                },
            ),
            AppError::UploadsDisabled => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "UPLOADS_DISABLED",
                    message: "Public uploads are disabled".into(),
                },
            ),
            AppError::PathDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PATH_DENIED",
                    message: "Path is outside the managed storage root".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Expired => (
                StatusCode::GONE,
                ErrorBody {
                    code: "EXPIRED",
                    message: "This file has expired".into(),
                },
            ),
            AppError::DuplicateCode => {
                tracing::error!("retrieval code retries exhausted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "CONFIGURATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_FAILURE",
                        message: "File storage failed".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation error: {msg}"),
            AppError::FileTooLarge { limit_mb } => {
                write!(f, "file too large (limit {limit_mb}MB)")
            }
            AppError::QuotaExceeded { limit_mb } => {
                write!(f, "quota exceeded (limit {limit_mb}MB)")
            }
            AppError::UploadsDisabled => write!(f, "uploads disabled"),
            AppError::PathDenied => write!(f, "path denied"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Expired => write!(f, "expired"),
            AppError::DuplicateCode => write!(f, "duplicate retrieval code"),
            AppError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            AppError::Storage(detail) => write!(f, "storage failure: {detail}"),
            AppError::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                AppError::NotFound(format!("Stored file not found: {path}"))
            }
            StorageError::SizeLimitExceeded { limit, .. } => AppError::FileTooLarge {
                limit_mb: limit / (1024 * 1024),
            },
            StorageError::PathDenied(_) => AppError::PathDenied,
            StorageError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}
