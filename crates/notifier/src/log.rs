//! Log-only sink for local runs without a configured webhook.

use async_trait::async_trait;

use nudge_common::error::AppError;
use nudge_common::types::NotificationOptions;

use crate::NotificationSink;

/// Writes notifications to the log instead of delivering them.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn present(&self, notification: &NotificationOptions) -> Result<(), AppError> {
        tracing::info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "Notification (log sink)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
