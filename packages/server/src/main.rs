use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use server::clock::SystemClock;
use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    server::schema::ensure_indexes(&db)
        .await
        .context("Failed to create database indexes")?;

    let state = AppState::build(config.clone(), db, Arc::new(SystemClock))
        .await
        .context("Failed to initialize services")?;

    tokio::spawn(state.expiry_reaper().run());

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server running at http://{}", listener.local_addr()?);
    info!("Upload directory: {}", config.storage.upload_dir.display());

    axum::serve(listener, app).await?;

    Ok(())
}
