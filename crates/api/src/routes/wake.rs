//! Wake events — host-delivered triggers for scheduling checks.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use nudge_common::error::AppError;
use nudge_common::types::WakeSource;
use nudge_engine::dispatcher::FireOutcome;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/wake", post(wake))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WakeRequest {
    /// Channel to check. Omitted = full pass over every channel + welcome.
    channel: Option<String>,
    /// Originating trigger; defaults to a manual test wake.
    source: Option<WakeSource>,
}

/// POST /api/wake — Run a scheduling check (sync tag, manual test trigger).
async fn wake(
    State(state): State<AppState>,
    Json(request): Json<WakeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let source = request.source.unwrap_or(WakeSource::Manual);
    let now = Local::now();

    let fired = match &request.channel {
        Some(channel) => {
            let outcome = state
                .dispatcher
                .fire(channel, source, now.timestamp_millis())
                .await?;
            u32::from(outcome == FireOutcome::Fired)
        }
        None => state.dispatcher.check_all(source, now).await,
    };

    Ok(Json(json!({ "source": source, "fired": fired })))
}
