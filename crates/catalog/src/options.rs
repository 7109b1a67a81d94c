//! Layered display-option resolution.
//!
//! An outbound notification is assembled from three layers, applied in a
//! fixed precedence order:
//!
//! 1. base display defaults (lowest)
//! 2. per-kind defaults
//! 3. payload overrides (highest)
//!
//! Later layers win field-by-field; an omitted field keeps the value from
//! the layer below.

use nudge_common::types::{
    NotificationAction, NotificationKind, NotificationOptions, NotificationOverrides,
};

pub const DEFAULT_ICON: &str = "/icons/logo-192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72.png";
pub const DEFAULT_TAG: &str = "nudge-notification";

/// The base display defaults every notification starts from.
pub fn base_defaults() -> NotificationOptions {
    NotificationOptions {
        title: "Nudge".to_string(),
        body: "You have a new notification.".to_string(),
        icon: DEFAULT_ICON.to_string(),
        badge: DEFAULT_BADGE.to_string(),
        tag: DEFAULT_TAG.to_string(),
        require_interaction: false,
        vibration_pattern: vec![200, 100, 200],
        actions: vec![
            NotificationAction {
                action: "open".to_string(),
                title: "Open App".to_string(),
            },
            NotificationAction {
                action: "dismiss".to_string(),
                title: "Dismiss".to_string(),
            },
        ],
        data: serde_json::Value::Null,
    }
}

/// Per-kind display defaults, the middle resolution layer.
pub fn kind_defaults(kind: NotificationKind) -> NotificationOverrides {
    match kind {
        // Reminders are transient and buzz gently.
        NotificationKind::Reminder => NotificationOverrides {
            require_interaction: Some(false),
            ..Default::default()
        },
        // Tips are silent; no vibration.
        NotificationKind::Tip => NotificationOverrides {
            require_interaction: Some(false),
            vibration_pattern: Some(vec![]),
            ..Default::default()
        },
        // Digests stay on screen until acted on.
        NotificationKind::Digest => NotificationOverrides {
            require_interaction: Some(true),
            ..Default::default()
        },
        NotificationKind::Welcome => NotificationOverrides {
            require_interaction: Some(true),
            vibration_pattern: Some(vec![100, 50, 100]),
            ..Default::default()
        },
    }
}

/// Resolve the final display options from the three layers.
pub fn resolve(
    base: &NotificationOptions,
    kind: &NotificationOverrides,
    payload: &NotificationOverrides,
) -> NotificationOptions {
    let mut resolved = base.clone();
    apply(&mut resolved, kind);
    apply(&mut resolved, payload);
    resolved
}

/// Resolve for a known kind: base defaults + kind defaults + payload.
pub fn resolve_for_kind(
    kind: NotificationKind,
    payload: &NotificationOverrides,
) -> NotificationOptions {
    resolve(&base_defaults(), &kind_defaults(kind), payload)
}

fn apply(target: &mut NotificationOptions, layer: &NotificationOverrides) {
    if let Some(title) = &layer.title {
        target.title = title.clone();
    }
    if let Some(body) = &layer.body {
        target.body = body.clone();
    }
    if let Some(icon) = &layer.icon {
        target.icon = icon.clone();
    }
    if let Some(badge) = &layer.badge {
        target.badge = badge.clone();
    }
    if let Some(tag) = &layer.tag {
        target.tag = tag.clone();
    }
    if let Some(require_interaction) = layer.require_interaction {
        target.require_interaction = require_interaction;
    }
    if let Some(vibration_pattern) = &layer.vibration_pattern {
        target.vibration_pattern = vibration_pattern.clone();
    }
    if let Some(actions) = &layer.actions {
        target.actions = actions.clone();
    }
    if let Some(data) = &layer.data {
        target.data = data.clone();
    }
}
