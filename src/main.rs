//! PhishWatch Cloud Backend Server
//!
//! Stores phishing-attempt reports, serves them over HTTP with an optional
//! category filter, and fans out change notifications across delivery
//! channels (Gmail, Outlook, SMS, social media).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PHISHWATCH CLOUD                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │  API      │   │  Change      │   │  Notification       │  │
//! │  │  Gateway  │   │  Watcher     │──▶│  Senders            │  │
//! │  │  (Axum)   │   │  (LISTEN/    │   │  (Gmail/Outlook/    │  │
//! │  │           │   │   NOTIFY)    │   │   SMS/Social)       │  │
//! │  └─────┬─────┘   └──────┬───────┘   └─────────────────────┘  │
//! │        └────────────────┘                                    │
//! │                ▼                                             │
//! │         ┌─────────────┐                                      │
//! │         │ PostgreSQL  │                                      │
//! │         └─────────────┘                                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod senders;
mod watcher;
mod error;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;

use crate::models::AttemptFilter;
use crate::senders::create_enabled_senders;
use crate::watcher::Watcher;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "phishwatch_cloud=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("PhishWatch Cloud Server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .expect("Failed to create database pool");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .expect("Failed to run migrations");

    // Start the change-driven notifier: one process-owned subscription,
    // closed explicitly on shutdown
    let senders = create_enabled_senders(&config.channels);
    let filter = AttemptFilter::for_category(config.notify_category.clone());
    let watcher_handle = Watcher::new(pool.clone(), filter, senders)
        .subscribe()
        .await
        .expect("Failed to establish change subscription");

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    watcher_handle.close().await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/phishing-attempts", get(handlers::attempts::list))
        .route("/api/v1/phishing-attempts", post(handlers::attempts::report))
        .route("/api/v1/phishing-attempts/:id", get(handlers::attempts::get))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
