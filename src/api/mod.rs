//! REST API around the energy policy.
//!
//! Endpoints:
//! - `POST /evaluate` — evaluate a snapshot config sent as JSON
//! - `GET /state` — replay config, KPIs and latest step
//! - `GET /telemetry` — replay step records with optional range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::SnapshotConfig;
use crate::sim::kpi::ReplayKpis;
use crate::sim::types::StepRecord;

/// Immutable application state shared across all request handlers.
///
/// Built once after the replay completes and wrapped in `Arc`; the policy
/// itself is stateless, so no locks are needed.
pub struct AppState {
    /// Configuration the replay ran with.
    pub config: SnapshotConfig,
    /// Aggregate replay KPIs.
    pub kpis: ReplayKpis,
    /// Per-step replay records.
    pub records: Vec<StepRecord>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/evaluate", post(handlers::post_evaluate))
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
