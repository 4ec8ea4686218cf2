//! Bandstand API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use bandstand_application::{DocumentStore, LocalizationService};
use bandstand_core::AppError;
use bandstand_infrastructure::{
    EmbeddedTranslationSource, InMemoryDocumentStore, PostgresDocumentStore,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, StorageConfig, init_tracing};
use crate::api_router::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let store: Arc<dyn DocumentStore> = match &config.storage {
        StorageConfig::Memory => {
            info!("using in-memory storage");
            Arc::new(InMemoryDocumentStore::new())
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to connect to database: {error}"))
                })?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            Arc::new(PostgresDocumentStore::new(pool))
        }
    };

    let localization =
        LocalizationService::load(&EmbeddedTranslationSource::new(), &config.default_language)?;
    info!(
        default_language = localization.default_language(),
        max_limit = config.query_max_limit,
        "catalog services ready"
    );

    let app_state = AppState::new(store, config.query_max_limit, localization);
    let app = build_router(app_state, config.frontend_url.as_deref())?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "bandstand-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
