//! Scheduling decisions — pure functions over channels and persisted state.
//!
//! Checks are polled every few minutes rather than precisely scheduled. The
//! design tolerates drift and missed checks (device asleep, suspended
//! process) by firing as soon as a check observes the interval elapsed —
//! at most once per interval, with no backlog of catch-up fires.

use nudge_common::types::{Channel, EpochMillis, NotificationSpec, NotificationState};

/// Stateless due/rotation logic.
pub struct Scheduler;

impl Scheduler {
    /// Whether a channel should fire at `now`.
    ///
    /// Due when the interval has elapsed since the last fire, or when the
    /// channel never fired (a fresh installation is immediately due).
    pub fn is_due(channel: &Channel, state: &NotificationState, now: EpochMillis) -> bool {
        let last = state.last_fired_for(&channel.id);
        last == 0 || now - last >= channel.interval_ms
    }

    /// Pick the next pool entry round-robin and the index to persist after
    /// a successful fire.
    ///
    /// Pools are non-empty by catalog validation; a stale persisted index
    /// (e.g. after a pool shrank between releases) wraps instead of panicking.
    pub fn select_next(channel: &Channel, state: &NotificationState) -> (NotificationSpec, u32) {
        let len = channel.pool.len() as u32;
        let index = state.rotation_for(&channel.id) % len;
        let next = (index + 1) % len;
        (channel.pool[index as usize].clone(), next)
    }

    /// Whether the once-per-calendar-day welcome should fire today.
    pub fn is_welcome_due(state: &NotificationState, today: &str) -> bool {
        state.last_welcome_date.as_deref() != Some(today)
    }

    /// Earliest instant the channel becomes due again; 0 = due immediately.
    pub fn next_due_at(channel: &Channel, state: &NotificationState) -> EpochMillis {
        let last = state.last_fired_for(&channel.id);
        if last == 0 { 0 } else { last + channel.interval_ms }
    }
}
