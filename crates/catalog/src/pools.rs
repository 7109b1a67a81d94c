//! Canned notification content for the built-in channels.
//!
//! Pool order matters: entries fire round-robin, so each pool is ordered the
//! way users should encounter it on a fresh installation.

use nudge_common::types::{Channel, EpochMillis, NotificationKind, NotificationSpec};

use crate::options::DEFAULT_ICON;

const HOUR_MS: EpochMillis = 60 * 60 * 1000;

fn spec(title: &str, body: &str, kind: NotificationKind) -> NotificationSpec {
    NotificationSpec {
        title: title.to_string(),
        body: body.to_string(),
        kind,
        icon: DEFAULT_ICON.to_string(),
    }
}

/// All built-in channels, in catalog order.
pub fn builtin_channels() -> Vec<Channel> {
    vec![six_hourly(), twelve_hourly(), daily()]
}

/// Short check-in reminders, every 6 hours.
fn six_hourly() -> Channel {
    Channel {
        id: "6h".to_string(),
        interval_ms: 6 * HOUR_MS,
        pool: vec![
            spec(
                "Time to check in",
                "A quick review of your day keeps your streak alive.",
                NotificationKind::Reminder,
            ),
            spec(
                "Stretch break",
                "You've been heads-down for a while. Two minutes of movement resets your focus.",
                NotificationKind::Reminder,
            ),
            spec(
                "Quick capture",
                "Anything on your mind? Jot it down before it slips away.",
                NotificationKind::Reminder,
            ),
            spec(
                "Hydration check",
                "Grab a glass of water before your next task.",
                NotificationKind::Reminder,
            ),
        ],
    }
}

/// Usage tips, every 12 hours.
fn twelve_hourly() -> Channel {
    Channel {
        id: "12h".to_string(),
        interval_ms: 12 * HOUR_MS,
        pool: vec![
            spec(
                "Plan tomorrow tonight",
                "Five minutes lining up tomorrow's top three tasks pays off in the morning.",
                NotificationKind::Tip,
            ),
            spec(
                "Review your streaks",
                "Consistency beats intensity. See how your week is shaping up.",
                NotificationKind::Tip,
            ),
            spec(
                "Clear your capture list",
                "An empty inbox is a quiet mind. Sort what you've collected.",
                NotificationKind::Tip,
            ),
        ],
    }
}

/// End-of-day digest, every 24 hours.
fn daily() -> Channel {
    Channel {
        id: "daily".to_string(),
        interval_ms: 24 * HOUR_MS,
        pool: vec![
            spec(
                "Your daily digest is ready",
                "See what you accomplished today and what's up next.",
                NotificationKind::Digest,
            ),
            spec(
                "Today in review",
                "Your focus sessions and completed tasks, summarized.",
                NotificationKind::Digest,
            ),
            spec(
                "Evening wrap-up",
                "Close the day with a one-minute review.",
                NotificationKind::Digest,
            ),
        ],
    }
}

/// The once-per-calendar-day welcome entry. Gated by date, not interval.
pub fn welcome() -> NotificationSpec {
    spec(
        "Welcome back!",
        "Ready to pick up where you left off?",
        NotificationKind::Welcome,
    )
}
