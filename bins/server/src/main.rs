//! Agora API Server
//!
//! Main entry point for the Agora backend service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agora_api::{AppState, create_router};
use agora_core::storage::{PhotoStorage, StorageConfig};
use agora_db::connect;
use agora_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("Failed to connect to database")?;
    info!("Connected to database");

    // Refuse to start without a usable signing key pair
    let jwt_service =
        JwtService::from_config(&config.jwt).context("Failed to load JWT keys")?;
    info!(expires_in = jwt_service.expires_in(), "JWT service configured");

    let storage = match config.storage {
        Some(settings) => {
            let storage = PhotoStorage::from_config(StorageConfig::from(settings))
                .context("Failed to configure photo storage")?;
            info!(provider = storage.provider_name(), "Photo storage configured");
            Some(storage)
        }
        None => {
            warn!("No storage configured, photo uploads are disabled");
            None
        }
    };

    let state = AppState::new(db, jwt_service, storage);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
