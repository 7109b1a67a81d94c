//! Scheduling status query for the host UI.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use nudge_common::error::AppError;
use nudge_common::types::StatusReport;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/status", get(get_status))
}

/// GET /api/status — Per-channel last-fired and next-due times.
async fn get_status(State(state): State<AppState>) -> Result<Json<StatusReport>, AppError> {
    let report = state
        .dispatcher
        .status(Utc::now().timestamp_millis())
        .await?;
    Ok(Json(report))
}
