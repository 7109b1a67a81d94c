//! Administrative commands from the host app.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use nudge_common::error::AppError;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reset", post(reset))
}

/// POST /api/reset — Clear persisted notification state to defaults.
/// Every channel becomes immediately due again.
async fn reset(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.dispatcher.reset().await?;
    Ok(Json(json!({ "reset": true })))
}
