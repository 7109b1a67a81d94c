//! Nudge scheduler service binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nudge_catalog::Catalog;
use nudge_common::config::AppConfig;
use nudge_common::redis_pool::create_redis_pool;
use nudge_engine::dispatcher::Dispatcher;
use nudge_engine::store::{RedisStateStore, StateStore};
use nudge_engine::ticker::Ticker;
use nudge_notifier::log::LogSink;
use nudge_notifier::webhook::WebhookSink;
use nudge_notifier::NotificationSink;

use nudge_api::routes::create_router;
use nudge_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("nudge_api=debug,nudge_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Nudge scheduler service...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Catalog is validated before any wake event is accepted: an empty
    // pool, duplicate channel id or bad interval aborts startup here.
    let catalog = Arc::new(Catalog::builtin());
    catalog.validate()?;
    tracing::info!(channels = catalog.channels().len(), "Catalog validated");

    // Connect to Redis
    let redis = create_redis_pool(&config.redis_url).await?;
    let store: Arc<dyn StateStore> = Arc::new(RedisStateStore::new(redis));

    // Pick the notification sink
    let sink: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.clone(), config.notify_timeout_secs)?),
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set; notifications will only be logged");
            Arc::new(LogSink)
        }
    };
    tracing::info!(sink = sink.name(), "Notification sink ready");

    let dispatcher = Arc::new(Dispatcher::new(catalog, store, sink));

    // Start the wake timer
    let ticker = Ticker::new(dispatcher.clone(), config.check_interval_secs);
    tokio::spawn(async move { ticker.run().await });

    // Build application state + router
    let state = AppState::new(dispatcher, config);
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Nudge scheduler service stopped.");
    Ok(())
}
