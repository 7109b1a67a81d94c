use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wall-clock timestamps are carried as epoch milliseconds, matching the
/// persisted state layout.
pub type EpochMillis = i64;

/// Host-delivered triggers that may prompt a scheduling check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeSource {
    Timer,
    Push,
    Sync,
    Manual,
}

impl std::fmt::Display for WakeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WakeSource::Timer => write!(f, "timer"),
            WakeSource::Push => write!(f, "push"),
            WakeSource::Sync => write!(f, "sync"),
            WakeSource::Manual => write!(f, "manual"),
        }
    }
}

/// Category tag of a canned notification, used to pick the per-kind
/// display defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reminder,
    Tip,
    Digest,
    Welcome,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Reminder => write!(f, "reminder"),
            NotificationKind::Tip => write!(f, "tip"),
            NotificationKind::Digest => write!(f, "digest"),
            NotificationKind::Welcome => write!(f, "welcome"),
        }
    }
}

/// Immutable entry of a channel's rotation pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub icon: String,
}

/// A named category of periodic notification with its own minimum gap
/// between fires and an ordered rotation pool. Static configuration,
/// never persisted.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub interval_ms: EpochMillis,
    pub pool: Vec<NotificationSpec>,
}

/// The single persisted scheduling record. Survives process restarts; an
/// absent record is equivalent to the default-initialized value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationState {
    /// Last time each channel fired, epoch millis. Absent or 0 = never.
    pub last_fired: HashMap<String, EpochMillis>,
    /// Next pool index to use per channel, wraps modulo pool length.
    pub rotation_index: HashMap<String, u32>,
    /// Last local calendar date the welcome notification fired,
    /// e.g. "Mon Jan 01 2024".
    pub last_welcome_date: Option<String>,
}

impl NotificationState {
    /// Last fire time for a channel, 0 if it never fired.
    pub fn last_fired_for(&self, channel_id: &str) -> EpochMillis {
        self.last_fired.get(channel_id).copied().unwrap_or(0)
    }

    /// Current rotation index for a channel, 0 if never advanced.
    pub fn rotation_for(&self, channel_id: &str) -> u32 {
        self.rotation_index.get(channel_id).copied().unwrap_or(0)
    }
}

/// An action button attached to an outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Fully-resolved outbound notification, ready for the presentation
/// surface. Field names follow the web notification options layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub vibration_pattern: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: serde_json::Value,
}

/// Partial notification fields overlaid on the display defaults. Omitted
/// fields mean "keep the lower layer's value".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationOverrides {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub kind: Option<NotificationKind>,
    pub require_interaction: Option<bool>,
    pub vibration_pattern: Option<Vec<u32>>,
    pub actions: Option<Vec<NotificationAction>>,
    pub data: Option<serde_json::Value>,
}

/// Per-channel scheduling status for the host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub channel: String,
    pub interval_ms: EpochMillis,
    /// 0 = never fired.
    pub last_fired: EpochMillis,
    /// Earliest time the channel becomes due again; 0 = due immediately.
    pub next_due_at: EpochMillis,
    pub due_now: bool,
}

/// Full status snapshot returned by the status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub checked_at: EpochMillis,
    pub channels: Vec<ChannelStatus>,
    pub last_welcome_date: Option<String>,
}
