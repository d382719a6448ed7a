//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use super::AppState;
use super::types::{ErrorResponse, EvaluateResponse, StateResponse, TelemetryQuery};
use crate::config::SnapshotConfig;
use crate::sim::types::StepRecord;

/// Evaluates one snapshot.
///
/// `POST /evaluate` + `SnapshotConfig` JSON → 200 + `EvaluateResponse`
/// Invalid config → 422 + `ErrorResponse` listing every violation
pub async fn post_evaluate(
    Json(config): Json<SnapshotConfig>,
) -> Result<Json<EvaluateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let errors = config.validate();
    if !errors.is_empty() {
        warn!(count = errors.len(), "rejected snapshot");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                errors: errors.iter().map(ToString::to_string).collect(),
            }),
        ));
    }

    let snapshot = config.build_snapshot().map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::single(e.to_string())),
        )
    })?;
    let result = config.energy_policy().evaluate(&snapshot);
    Ok(Json(EvaluateResponse { result }))
}

/// Returns replay config, KPIs and latest step.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        kpis: state.kpis.clone(),
        latest_step: state.records.last().cloned(),
    })
}

/// Returns replay records, optionally filtered by timestep range.
///
/// `GET /telemetry` → 200 + `Vec<StepRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::single(format!(
                "`from` ({from}) must be <= `to` ({to})"
            ))),
        ));
    }

    let records: Vec<StepRecord> = state
        .records
        .iter()
        .filter(|r| r.timestep >= from && r.timestep <= to)
        .cloned()
        .collect();

    Ok(Json(records))
}
