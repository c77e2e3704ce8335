use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use common::storage::{DownloadSource, StorageKind};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Serve the raw bytes behind a record's `data_url`.
///
/// Local files are streamed with a `Content-Disposition` carrying the
/// original filename (the on-disk name is the opaque storage path);
/// object-store records redirect to a fresh presigned URL.
#[instrument(skip(state, headers))]
pub async fn serve_stored_file(
    State(state): State<AppState>,
    Path(storage_path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = state
        .records
        .find_by_storage_path(&storage_path)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    if record.expire_at.is_some_and(|at| at <= state.clock.now()) {
        return Err(AppError::Expired);
    }

    // The content hash is immutable, which makes it a perfect ETag.
    let etag_value = format!("\"{}\"", record.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let kind = StorageKind::parse(&record.storage_kind).ok_or_else(|| {
        AppError::Internal(format!("unknown storage kind: {}", record.storage_kind))
    })?;

    let settings = state.settings.load().await?;
    let backend = state.backends.resolve(kind, &settings)?;

    match backend.resolve_download(&record.storage_path).await? {
        DownloadSource::Redirect(url) => Ok(Redirect::temporary(&url).into_response()),
        DownloadSource::Stream(reader) => {
            let body = Body::from_stream(ReaderStream::new(reader));

            let response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, &record.mime_type)
                .header(header::CONTENT_LENGTH, record.size.to_string())
                .header(
                    header::CONTENT_DISPOSITION,
                    content_disposition_value(&record.name),
                )
                .header(header::ETAG, &etag_value)
                .header(header::CACHE_CONTROL, "private, max-age=3600")
                .body(body)
                .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

            Ok(response)
        }
    }
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
