//! Shared application state for the Axum API server.

use std::sync::Arc;

use nudge_common::config::AppConfig;
use nudge_engine::dispatcher::Dispatcher;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, config: AppConfig) -> Self {
        Self { dispatcher, config }
    }
}
