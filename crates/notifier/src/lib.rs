//! Notification presentation surface.
//!
//! The scheduler core never talks to a delivery mechanism directly; it hands
//! fully-resolved [`NotificationOptions`] to a [`NotificationSink`]. Sinks
//! must fail in bounded time — the host may suspend the process at any
//! moment, so a hung presentation call only delays the next check, never
//! corrupts state.

pub mod log;
pub mod webhook;

use async_trait::async_trait;

use nudge_common::error::AppError;
use nudge_common::types::NotificationOptions;

/// Presentation adapters implement this trait.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Present a notification. A rejection maps to `AppError::Display`;
    /// the caller treats the fire as not having happened.
    async fn present(&self, notification: &NotificationOptions) -> Result<(), AppError>;

    /// Human-readable name for this sink (e.g., "webhook").
    fn name(&self) -> &'static str;
}
