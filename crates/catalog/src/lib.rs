//! Static notification catalog.
//!
//! Holds the channel definitions (id, minimum interval, ordered rotation
//! pool) and the one-per-day welcome entry. The catalog is read-only
//! configuration: it is built once at startup, validated before the service
//! accepts any wake event, and shared immutably afterwards.

pub mod options;
pub mod pools;


use std::collections::HashSet;

use nudge_common::error::AppError;
use nudge_common::types::{Channel, NotificationSpec};

/// Registry of all notification channels plus the welcome entry.
pub struct Catalog {
    channels: Vec<Channel>,
    welcome: NotificationSpec,
}

impl Catalog {
    /// Build the product's built-in catalog (6h / 12h / daily channels).
    pub fn builtin() -> Self {
        Self {
            channels: pools::builtin_channels(),
            welcome: pools::welcome(),
        }
    }

    /// Build a catalog from explicit channels. Used by tests.
    pub fn new(channels: Vec<Channel>, welcome: NotificationSpec) -> Self {
        Self { channels, welcome }
    }

    /// Validate the catalog. A channel with an empty pool, a duplicate id,
    /// or a non-positive interval is a configuration error and must abort
    /// startup — these conditions never surface at fire time.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut seen = HashSet::new();

        for channel in &self.channels {
            if channel.id.is_empty() {
                return Err(AppError::Config("channel with empty id".to_string()));
            }
            if !seen.insert(channel.id.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate channel id: {}",
                    channel.id
                )));
            }
            if channel.pool.is_empty() {
                return Err(AppError::Config(format!(
                    "channel {} has an empty notification pool",
                    channel.id
                )));
            }
            if channel.interval_ms <= 0 {
                return Err(AppError::Config(format!(
                    "channel {} has a non-positive interval",
                    channel.id
                )));
            }
        }

        if self.welcome.title.is_empty() {
            return Err(AppError::Config("welcome entry has an empty title".to_string()));
        }

        Ok(())
    }

    /// Look up a channel by id.
    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// All channels, in catalog order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// The daily welcome entry.
    pub fn welcome(&self) -> &NotificationSpec {
        &self.welcome
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
