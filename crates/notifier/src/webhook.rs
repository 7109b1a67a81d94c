//! Webhook sink — POSTs resolved notifications as JSON to the host surface.

use std::time::Duration;

use async_trait::async_trait;

use nudge_common::error::AppError;
use nudge_common::types::NotificationOptions;

use crate::NotificationSink;

/// Delivers notifications to a configured webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Build a sink with a bounded per-request timeout.
    pub fn new(url: String, timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("webhook client: {e}")))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn present(&self, notification: &NotificationOptions) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| AppError::Display(format!("webhook delivery failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Display(format!(
                "webhook rejected notification: HTTP {status}"
            )));
        }

        tracing::debug!(
            tag = %notification.tag,
            title = %notification.title,
            "Notification delivered via webhook"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
