//! HTTP/WebSocket server wiring.
//!
//! Builds the axum router (task API plus the notifications WebSocket
//! endpoint) around a single [`AppState`] holding the task store and the
//! connection registry. The registry is constructed here and injected into
//! the store's observer at startup; nothing reaches it through globals.

pub mod api;
pub mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::notify::TaskObserver;
use crate::registry::ConnectionRegistry;
use crate::store::TaskStore;

pub use api::{AppState, SharedState};

/// Configuration for the taskhub server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8731,
            dev_mode: false,
        }
    }
}

/// Wires registry, observer, and store into a fresh application state.
pub fn build_state() -> SharedState {
    let registry = Arc::new(ConnectionRegistry::new());
    let store = TaskStore::new(TaskObserver::new(Arc::clone(&registry)));
    Arc::new(AppState { store, registry })
}

/// Build the full application router with the task API and the
/// notifications WebSocket endpoint.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .route("/ws/notifications/{user_id}", get(ws::ws_handler))
        .with_state(state)
}

/// Start the taskhub server.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let state = build_state();
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("taskhub running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down...");
}
