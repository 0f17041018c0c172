//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, InMemoryAdapter},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, AppState},
};
use mentorconnect_core::ports::{DatabaseService, NotificationService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Storage Adapter ---
    let (db, notifier): (Arc<dyn DatabaseService>, Arc<dyn NotificationService>) =
        match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                let db: Arc<dyn DatabaseService> = db_adapter.clone();
                let notifier: Arc<dyn NotificationService> = db_adapter;
                (db, notifier)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; all data is lost on shutdown");
                let adapter = Arc::new(InMemoryAdapter::new());
                let db: Arc<dyn DatabaseService> = adapter.clone();
                let notifier: Arc<dyn NotificationService> = adapter;
                (db, notifier)
            }
        };

    // --- 3. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(db, notifier, config.clone()));
    let app = build_router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
