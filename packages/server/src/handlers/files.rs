use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use common::ContentHash;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::models::file::{DeleteResponse, FileListResponse, FileResponse};
use crate::services::upload::NewUpload;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Uploads a file and returns its record, including the retrieval code. \
        Uploading content that is already stored returns the existing record unchanged \
        instead of storing a second copy.",
    request_body(content_type = "multipart/form-data", description = "The `file` field is required"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Missing or malformed input (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Uploads disabled (UPLOADS_DISABLED)", body = ErrorBody),
        (status = 413, description = "Size or quota limit hit (FILE_TOO_LARGE, QUOTA_EXCEEDED)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // Reject from the declared length alone when we can, before reading
    // the body. The actual size is re-checked after transfer; a declared
    // size is not trustworthy.
    let settings = state.settings.load().await?;
    if let Some(declared) = content_length(&headers)
        && declared > settings.max_file_size_bytes()
    {
        return Err(AppError::FileTooLarge {
            limit_mb: settings.max_file_size_mb,
        });
    }

    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("File field must have a filename".into())
                    })?;
                let declared_mime = field.content_type().map(|m| m.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;

                upload = Some(NewUpload {
                    data,
                    original_name,
                    declared_mime,
                });
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let record = state.uploads.upload(upload).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List all file records",
    description = "Returns every record, newest first. Admin surface; access control \
        is enforced by the deployment in front of this service.",
    responses(
        (status = 200, description = "File list", body = FileListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let records = state.records.list_all().await?;

    let total = records.len() as u64;
    let files = records.into_iter().map(FileResponse::from).collect();

    Ok(Json(FileListResponse { files, total }))
}

#[utoipa::path(
    get,
    path = "/code/{code}",
    tag = "Files",
    operation_id = "getFileByCode",
    summary = "Look up a file by retrieval code",
    description = "Case-insensitive. A record past its expiry returns 410, distinct from \
        an unknown code, even while the background sweep has not removed it yet.",
    params(("code" = String, Path, description = "6-character retrieval code")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 400, description = "Malformed code (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown code (NOT_FOUND)", body = ErrorBody),
        (status = 410, description = "File expired (EXPIRED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let record = state.downloads.resolve(&code).await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/hash/{hash}",
    tag = "Files",
    operation_id = "getFileByHash",
    summary = "Look up a file by content hash",
    params(("hash" = String, Path, description = "SHA-256 content hash, hex")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 400, description = "Malformed hash (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No record with this hash (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let hash = ContentHash::from_hex(&hash).map_err(|e| AppError::Validation(e.to_string()))?;

    let record = state
        .records
        .find_by_hash(&hash)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFileById",
    summary = "Look up a file by record ID",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such record (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let record = state
        .records
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    patch,
    path = "/{id}/download",
    tag = "Files",
    operation_id = "incrementDownload",
    summary = "Record a completed download",
    description = "Atomically increments the download counter and returns the updated record.",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "Updated file record", body = FileResponse),
        (status = 404, description = "No such record (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn increment_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let record = state.downloads.record_download(parse_id(&id)?).await?;

    info!(code = %record.code, download_count = record.download_count, "Download recorded");

    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file record and its bytes",
    description = "Removes the stored bytes (best effort; a file already missing on disk \
        is fine) and then the record. Admin surface; access control is enforced by the \
        deployment in front of this service.",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "Deleted", body = DeleteResponse),
        (status = 404, description = "No such record (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_id(&id)?;

    let record = state
        .records
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let settings = state.settings.load().await?;
    state.backends.delete_bytes(&record, &settings).await;
    state.records.delete(id).await?;

    info!(code = %record.code, name = %record.name, "File deleted");

    Ok(Json(DeleteResponse { success: true }))
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid file ID".into()))
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
