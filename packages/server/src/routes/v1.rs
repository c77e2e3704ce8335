use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/files", file_routes(config))
        .nest("/settings", settings_routes())
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::files::list_files,
            handlers::files::upload_file
        ))
        .routes(routes!(handlers::files::get_file_by_code))
        .routes(routes!(handlers::files::get_file_by_hash))
        .routes(routes!(
            handlers::files::get_file,
            handlers::files::delete_file
        ))
        .routes(routes!(handlers::files::increment_download))
        .layer(DefaultBodyLimit::max(config.storage.max_body_size as usize))
}

fn settings_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::settings::get_settings,
        handlers::settings::update_settings
    ))
}
