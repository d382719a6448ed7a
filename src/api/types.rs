//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::SnapshotConfig;
use crate::policy::EvaluationResult;
use crate::sim::kpi::ReplayKpis;
use crate::sim::types::StepRecord;

/// Replay config, KPIs and the most recent step.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: SnapshotConfig,
    pub kpis: ReplayKpis,
    /// `None` when the replay produced no steps.
    pub latest_step: Option<StepRecord>,
}

/// Result of `POST /evaluate`.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub result: EvaluationResult,
}

/// Optional inclusive timestep range for `/telemetry`.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Error body returned with 4xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}
