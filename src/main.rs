use std::sync::Arc;

use practice_api::app::{build_router, AppState};
use practice_api::{config, events};
use practice_api::database::{DatabaseManager, MemoryDatabase, PgDatabase};
use practice_api::storage::{LocalObjectStore, ObjectStore};
use practice_api::video::TwilioVideoClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("practice_api=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    tracing::info!("Starting Practice API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let resources: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        &config.storage.root,
        &config.storage.resources_bucket,
    ));
    let documents: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        &config.storage.root,
        &config.storage.documents_bucket,
    ));
    let video = Arc::new(TwilioVideoClient::new(config.video.clone()));
    let port = config.api.port;

    let state = if config.database.url.is_empty() {
        if practice_api::is_production!() {
            anyhow::bail!("DATABASE_URL must be set in production");
        }
        tracing::warn!("DATABASE_URL is not set; using the in-memory store (data is lost on restart)");
        AppState::new(config, Arc::new(MemoryDatabase::new()), resources, documents, video)
    } else {
        let manager = DatabaseManager::connect(&config.database).await?;
        let db = Arc::new(PgDatabase::new(manager.clone()));
        AppState::new(config, db, resources, documents, video).with_database_manager(manager)
    };

    let change_log = events::spawn_change_log(state.template_settings_events());
    let app = build_router(state.clone());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Practice API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    change_log.abort();
    if let Some(database) = &state.database {
        database.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
