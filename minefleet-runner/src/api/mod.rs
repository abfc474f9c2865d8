//! API Module
//!
//! Local stats and control server for the runner.
//! Each submodule handles endpoints for a specific concern.

pub mod control;
pub mod error;
pub mod health;
pub mod stats;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use crate::scheduler::HashrateAggregator;

/// Shared state of the control server
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<HashrateAggregator>,
    /// Signalled when a kill request is accepted
    pub kill: Arc<Notify>,
    pub handle_kill: bool,
}

/// Create the control router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Stats
        .route("/stats", get(stats::get_stats))
        // Slot control
        .route("/slots/{index}/pause", post(control::pause_slot))
        .route("/slots/{index}/resume", post(control::resume_slot))
        .route("/kill", post(control::kill))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the control router until the process exits
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind control server to {}", addr))?;
    tracing::info!("Control server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("Control server failed")
}
