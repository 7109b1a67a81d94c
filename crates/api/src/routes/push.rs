//! Push events — externally-supplied notifications presented immediately.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use nudge_common::error::AppError;
use nudge_common::types::{NotificationOptions, NotificationOverrides};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/push", post(push))
}

/// POST /api/push — Overlay the payload on the display defaults and present
/// it. Returns the resolved notification. Scheduler state is not touched.
async fn push(
    State(state): State<AppState>,
    Json(overrides): Json<NotificationOverrides>,
) -> Result<Json<NotificationOptions>, AppError> {
    let resolved = state.dispatcher.push(&overrides).await?;
    Ok(Json(resolved))
}
