use axum::Json;
use axum::extract::State;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::state::AppState;
use crate::store::settings::{AppSettings, SettingsPatch};

#[utoipa::path(
    get,
    path = "/",
    tag = "Settings",
    operation_id = "getSettings",
    summary = "Read the current settings",
    description = "Defaults are merged in for fields missing from the persisted document.",
    responses(
        (status = 200, description = "Current settings", body = AppSettings),
    ),
)]
#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<AppSettings>, AppError> {
    Ok(Json(state.settings.load().await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Settings",
    operation_id = "updateSettings",
    summary = "Update settings",
    description = "Partial update with merge semantics: fields absent from the body keep \
        their previous value. Returns the resulting settings.",
    request_body = SettingsPatch,
    responses(
        (status = 200, description = "Merged settings", body = AppSettings),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, patch))]
pub async fn update_settings(
    State(state): State<AppState>,
    AppJson(patch): AppJson<SettingsPatch>,
) -> Result<Json<AppSettings>, AppError> {
    let saved = state.settings.save(patch).await?;

    info!(
        storage_kind = %saved.storage_kind,
        max_file_size_mb = saved.max_file_size_mb,
        storage_limit_mb = saved.storage_limit_mb,
        "Settings updated"
    );

    Ok(Json(saved))
}
