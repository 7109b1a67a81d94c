pub mod admin;
pub mod health;
pub mod push;
pub mod status;
pub mod wake;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(status::router())
        .merge(wake::router())
        .merge(push::router())
        .merge(admin::router())
        .with_state(state)
}
