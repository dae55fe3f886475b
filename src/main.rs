//! Roster Sync Backend
//!
//! Keeps an employee roster in memory, caches it in SQLite and shares it
//! between devices through a chunked, compressed payload on a remote
//! key/value bucket.

mod api;
mod auth;
mod chunk;
mod codec;
mod compress;
mod config;
mod db;
mod errors;
mod lookup;
mod models;
mod report;
mod store;
mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::LocalCache;
use store::HttpBlobStore;
use sync::SyncCoordinator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SyncCoordinator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Roster Sync Backend");
    tracing::info!("Cache path: {:?}", config.db_path);
    tracing::info!("Remote bucket: {}", config.sync_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.reset_key.is_none() {
        tracing::warn!("No reset key configured (ROSTER_RESET_KEY). Anyone can clear the roster!");
    }

    // Local cache
    let pool = db::init_database(&config.db_path).await?;
    let cache = LocalCache::new(pool);

    // Remote store and coordinator
    let store = HttpBlobStore::new(config.sync_base_url.clone(), config.http_timeout)?;
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::new(store),
        cache,
        config.chunk_size,
    ));
    coordinator.restore().await;

    let poller = coordinator.spawn_poller(config.sync_interval);

    let state = AppState {
        coordinator,
        config: Arc::new(config.clone()),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Only the destructive reset is gated
    let gate = auth::ResetGate::new(state.config.reset_key.clone());
    let reset = delete(api::reset_roster).route_layer(middleware::from_fn_with_state(
        gate,
        auth::require_reset_key,
    ));

    // API routes
    let api_routes = Router::new()
        // Roster
        .route("/status", get(api::get_status))
        .route(
            "/roster",
            get(api::get_roster).post(api::load_roster).merge(reset),
        )
        // Sync
        .route("/sync/pull", post(api::pull))
        .route("/sync/push", post(api::push))
        // Lookup and reports
        .route("/lookup", get(api::lookup))
        .route("/report", get(api::get_report));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
