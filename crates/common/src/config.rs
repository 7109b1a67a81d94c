use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection string
    pub redis_url: String,

    /// Scheduling check cadence in seconds (default: 300 = 5 min)
    pub check_interval_secs: u64,

    /// Webhook URL notifications are POSTed to. When unset, notifications
    /// are logged instead of delivered.
    pub notify_webhook_url: Option<String>,

    /// Per-request timeout for webhook delivery in seconds (default: 10)
    pub notify_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            check_interval_secs: std::env::var("CHECK_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CHECK_INTERVAL_SECS must be a valid u64"))?,
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            notify_timeout_secs: std::env::var("NOTIFY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_TIMEOUT_SECS must be a valid u64"))?,
        })
    }
}
