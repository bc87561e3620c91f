//! Administrative endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use souk_sync::SyncOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of a sync-trigger response. A completion signal only; per-record
/// detail goes to the logs.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    status: &'static str,
}

/// Trigger a reconciliation pass on demand.
///
/// Shares the single-flight guard with the scheduler: a pass already in
/// flight yields `already_running` without doing work. An unreachable
/// provider maps to 502.
pub async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, ApiError> {
    let status = match state.engine.synchronize().await? {
        SyncOutcome::Completed(_) => "completed",
        SyncOutcome::AlreadyRunning => "already_running",
    };
    Ok(Json(SyncResponse { status }))
}
