//! Dispatcher — the per-channel fire state machine.
//!
//! Each channel cycles NEVER_FIRED → DUE → WAITING → DUE … for the life of
//! the installation. A fire is:
//! 1. Load state (unreadable storage degrades to the zero state)
//! 2. Due check — not due is a successful no-op
//! 3. Select the next pool entry round-robin
//! 4. Present via the notification sink — a rejected display returns an
//!    error with state untouched, so the next due check retries it
//! 5. Persist `lastFired` + `rotationIndex` with a compare-and-swap save,
//!    re-applying on top of the fresh record when the swap is lost
//!
//! Fires from every wake source funnel through one `tokio::sync::Mutex`,
//! so in-process checks are serialized; the versioned save covers writers
//! in other processes.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use uuid::Uuid;

use nudge_catalog::{Catalog, options};
use nudge_common::error::AppError;
use nudge_common::types::{
    ChannelStatus, EpochMillis, NotificationOptions, NotificationOverrides, StatusReport,
    WakeSource,
};
use nudge_notifier::NotificationSink;

use crate::scheduler::Scheduler;
use crate::store::{StateStore, VersionedState};

/// Bounded save retries after a successful display.
const MAX_SAVE_ATTEMPTS: u32 = 4;

/// Local calendar date format backing the welcome rule, e.g. "Mon Jan 01 2024".
const WELCOME_DATE_FORMAT: &str = "%a %b %d %Y";

/// Result of a fire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Fired,
    NotDue,
}

/// Orchestrates scheduling checks across the catalog, the state store and
/// the notification sink.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    store: Arc<dyn StateStore>,
    sink: Arc<dyn NotificationSink>,
    fire_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn StateStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            catalog,
            store,
            sink,
            fire_lock: Mutex::new(()),
        }
    }

    /// Run one scheduling check for a channel.
    pub async fn fire(
        &self,
        channel_id: &str,
        source: WakeSource,
        now: EpochMillis,
    ) -> Result<FireOutcome, AppError> {
        let channel = self
            .catalog
            .channel(channel_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown channel: {channel_id}")))?;

        let _guard = self.fire_lock.lock().await;

        let mut versioned = self.load_or_default().await;
        if !Scheduler::is_due(channel, &versioned.state, now) {
            return Ok(FireOutcome::NotDue);
        }

        let (spec, mut next_index) = Scheduler::select_next(channel, &versioned.state);
        let dispatch_id = Uuid::new_v4();
        let payload = NotificationOverrides {
            title: Some(spec.title.clone()),
            body: Some(spec.body.clone()),
            icon: Some(spec.icon.clone()),
            // Stable per-channel tag: a new fire replaces the previous
            // notification instead of stacking.
            tag: Some(format!("nudge-{}", channel.id)),
            data: Some(serde_json::json!({
                "dispatchId": dispatch_id,
                "channel": channel.id,
                "source": source,
                "kind": spec.kind,
            })),
            ..Default::default()
        };
        let resolved = options::resolve_for_kind(spec.kind, &payload);

        // Present before persisting: a failed display leaves state untouched
        // and the entry is retried at the next due check.
        self.sink.present(&resolved).await?;

        for _ in 0..MAX_SAVE_ATTEMPTS {
            versioned
                .state
                .last_fired
                .insert(channel.id.clone(), now);
            versioned
                .state
                .rotation_index
                .insert(channel.id.clone(), next_index);

            if self.store.save(&versioned.state, versioned.version).await? {
                tracing::info!(
                    dispatch_id = %dispatch_id,
                    channel = %channel.id,
                    source = %source,
                    rotation_index = next_index,
                    "Notification fired"
                );
                return Ok(FireOutcome::Fired);
            }

            // Lost the swap: another writer advanced the record. The display
            // already happened, so re-apply exactly one increment on top of
            // the fresh state.
            versioned = self.store.load().await?;
            let len = channel.pool.len() as u32;
            next_index = (versioned.state.rotation_for(&channel.id) % len + 1) % len;
        }

        tracing::warn!(
            dispatch_id = %dispatch_id,
            channel = %channel.id,
            "Notification shown but state save kept conflicting; record is stale"
        );
        Err(AppError::Internal(format!(
            "state save conflicted {MAX_SAVE_ATTEMPTS} times for channel {}",
            channel.id
        )))
    }

    /// Run the once-per-calendar-day welcome check.
    pub async fn fire_welcome(
        &self,
        source: WakeSource,
        today: &str,
    ) -> Result<FireOutcome, AppError> {
        let _guard = self.fire_lock.lock().await;

        let mut versioned = self.load_or_default().await;
        if !Scheduler::is_welcome_due(&versioned.state, today) {
            return Ok(FireOutcome::NotDue);
        }

        let spec = self.catalog.welcome();
        let dispatch_id = Uuid::new_v4();
        let payload = NotificationOverrides {
            title: Some(spec.title.clone()),
            body: Some(spec.body.clone()),
            icon: Some(spec.icon.clone()),
            tag: Some("nudge-welcome".to_string()),
            data: Some(serde_json::json!({
                "dispatchId": dispatch_id,
                "source": source,
                "kind": spec.kind,
            })),
            ..Default::default()
        };
        let resolved = options::resolve_for_kind(spec.kind, &payload);

        self.sink.present(&resolved).await?;

        for _ in 0..MAX_SAVE_ATTEMPTS {
            versioned.state.last_welcome_date = Some(today.to_string());

            if self.store.save(&versioned.state, versioned.version).await? {
                tracing::info!(
                    dispatch_id = %dispatch_id,
                    source = %source,
                    date = today,
                    "Welcome notification fired"
                );
                return Ok(FireOutcome::Fired);
            }

            versioned = self.store.load().await?;
            if versioned.state.last_welcome_date.as_deref() == Some(today) {
                // A concurrent writer already recorded today's welcome.
                return Ok(FireOutcome::Fired);
            }
        }

        tracing::warn!(
            dispatch_id = %dispatch_id,
            "Welcome shown but state save kept conflicting; record is stale"
        );
        Err(AppError::Internal(
            "state save conflicted while recording welcome".to_string(),
        ))
    }

    /// One full scheduling pass: every channel plus the welcome rule.
    /// A failed channel never blocks the rest of the pass.
    pub async fn check_all(&self, source: WakeSource, now: DateTime<Local>) -> u32 {
        let now_ms = now.timestamp_millis();
        let today = now.format(WELCOME_DATE_FORMAT).to_string();
        let mut fired = 0u32;

        for channel in self.catalog.channels() {
            match self.fire(&channel.id, source, now_ms).await {
                Ok(FireOutcome::Fired) => fired += 1,
                Ok(FireOutcome::NotDue) => {}
                Err(e) => {
                    tracing::error!(channel = %channel.id, error = %e, "Fire attempt failed");
                }
            }
        }

        match self.fire_welcome(source, &today).await {
            Ok(FireOutcome::Fired) => fired += 1,
            Ok(FireOutcome::NotDue) => {}
            Err(e) => tracing::error!(error = %e, "Welcome fire attempt failed"),
        }

        fired
    }

    /// Present an externally-supplied notification immediately. Touches no
    /// scheduler state; overrides are resolved over the display defaults.
    pub async fn push(
        &self,
        overrides: &NotificationOverrides,
    ) -> Result<NotificationOptions, AppError> {
        let dispatch_id = Uuid::new_v4();
        let kind_layer = overrides
            .kind
            .map(options::kind_defaults)
            .unwrap_or_default();
        let mut resolved = options::resolve(&options::base_defaults(), &kind_layer, overrides);

        if resolved.data.is_null() {
            resolved.data = serde_json::json!({
                "dispatchId": dispatch_id,
                "source": WakeSource::Push,
            });
        }

        self.sink.present(&resolved).await?;

        tracing::info!(
            dispatch_id = %dispatch_id,
            tag = %resolved.tag,
            "Push notification presented"
        );
        Ok(resolved)
    }

    /// Status snapshot for the host UI.
    pub async fn status(&self, now: EpochMillis) -> Result<StatusReport, AppError> {
        let versioned = self.store.load().await?;

        let channels = self
            .catalog
            .channels()
            .iter()
            .map(|channel| ChannelStatus {
                channel: channel.id.clone(),
                interval_ms: channel.interval_ms,
                last_fired: versioned.state.last_fired_for(&channel.id),
                next_due_at: Scheduler::next_due_at(channel, &versioned.state),
                due_now: Scheduler::is_due(channel, &versioned.state, now),
            })
            .collect();

        Ok(StatusReport {
            checked_at: now,
            channels,
            last_welcome_date: versioned.state.last_welcome_date.clone(),
        })
    }

    /// Clear persisted state back to defaults ("clear notification state").
    pub async fn reset(&self) -> Result<(), AppError> {
        let _guard = self.fire_lock.lock().await;
        self.store.reset().await?;
        tracing::info!("Notification state reset to defaults");
        Ok(())
    }

    async fn load_or_default(&self) -> VersionedState {
        match self.store.load().await {
            Ok(versioned) => versioned,
            Err(e) => {
                // Unreadable storage degrades to the zero state: every
                // channel looks never-fired ("assume due"), which at worst
                // causes an extra immediate fire.
                tracing::warn!(error = %e, "State load failed; assuming fresh state");
                VersionedState::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use nudge_common::types::{Channel, NotificationKind, NotificationSpec, NotificationState};

    use crate::store::MemoryStateStore;

    const HOUR_MS: EpochMillis = 60 * 60 * 1000;

    /// Records every presented notification; can be told to reject.
    #[derive(Default)]
    struct RecordingSink {
        presented: AtomicU32,
        fail: AtomicBool,
        last: parking_lot::Mutex<Option<NotificationOptions>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn present(&self, notification: &NotificationOptions) -> Result<(), AppError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Display("surface rejected the call".to_string()));
            }
            self.presented.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(notification.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// Store wrapper that simulates a competing writer sneaking in between
    /// the dispatcher's load and its first save attempt.
    struct RacingStore {
        inner: MemoryStateStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl StateStore for RacingStore {
        async fn load(&self) -> Result<VersionedState, AppError> {
            self.inner.load().await
        }

        async fn save(
            &self,
            state: &NotificationState,
            expected_version: u64,
        ) -> Result<bool, AppError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                // Another installation process fires the same channel first.
                let fresh = self.inner.load().await?;
                let mut competing = fresh.state.clone();
                competing.last_fired.insert("6h".to_string(), 999);
                competing.rotation_index.insert("6h".to_string(), 1);
                assert!(self.inner.save(&competing, fresh.version).await?);
            }
            self.inner.save(state, expected_version).await
        }

        async fn reset(&self) -> Result<(), AppError> {
            self.inner.reset().await
        }
    }

    fn test_catalog() -> Arc<Catalog> {
        let pool: Vec<NotificationSpec> = (0..3)
            .map(|i| NotificationSpec {
                title: format!("entry {i}"),
                body: format!("body {i}"),
                kind: NotificationKind::Reminder,
                icon: "/icons/logo-192.png".to_string(),
            })
            .collect();
        let channel = Channel {
            id: "6h".to_string(),
            interval_ms: 6 * HOUR_MS,
            pool,
        };
        let welcome = NotificationSpec {
            title: "Welcome back!".to_string(),
            body: "Ready to pick up where you left off?".to_string(),
            kind: NotificationKind::Welcome,
            icon: "/icons/logo-192.png".to_string(),
        };
        Arc::new(Catalog::new(vec![channel], welcome))
    }

    fn build(
        store: Arc<dyn StateStore>,
    ) -> (Arc<Dispatcher>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Arc::new(Dispatcher::new(test_catalog(), store, sink.clone()));
        (dispatcher, sink)
    }

    #[tokio::test]
    async fn test_first_check_fires_entry_zero() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let outcome = dispatcher.fire("6h", WakeSource::Manual, 1_000).await.unwrap();
        assert_eq!(outcome, FireOutcome::Fired);

        let last = sink.last.lock().clone().unwrap();
        assert_eq!(last.title, "entry 0");
        assert_eq!(last.tag, "nudge-6h");
        assert_eq!(last.data["channel"], "6h");

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.last_fired_for("6h"), 1_000);
        assert_eq!(loaded.state.rotation_for("6h"), 1);
    }

    #[tokio::test]
    async fn test_check_within_interval_is_noop() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        dispatcher.fire("6h", WakeSource::Manual, 1_000).await.unwrap();

        // 1 hour later on a 6h channel: nothing.
        let outcome = dispatcher
            .fire("6h", WakeSource::Timer, 1_000 + HOUR_MS)
            .await
            .unwrap();
        assert_eq!(outcome, FireOutcome::NotDue);
        assert_eq!(sink.presented.load(Ordering::SeqCst), 1);

        // 7 hours after the first fire: entry 1.
        let outcome = dispatcher
            .fire("6h", WakeSource::Timer, 1_000 + 7 * HOUR_MS)
            .await
            .unwrap();
        assert_eq!(outcome, FireOutcome::Fired);
        assert_eq!(sink.last.lock().clone().unwrap().title, "entry 1");
    }

    #[tokio::test]
    async fn test_failed_display_leaves_state_untouched() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());
        sink.fail.store(true, Ordering::SeqCst);

        let err = dispatcher.fire("6h", WakeSource::Manual, 1_000).await.unwrap_err();
        assert!(matches!(err, AppError::Display(_)));

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.last_fired_for("6h"), 0);
        assert_eq!(loaded.state.rotation_for("6h"), 0);

        // The surface recovers: the same entry fires on the next due check.
        sink.fail.store(false, Ordering::SeqCst);
        dispatcher.fire("6h", WakeSource::Timer, 2_000).await.unwrap();
        assert_eq!(sink.last.lock().clone().unwrap().title, "entry 0");
    }

    #[tokio::test]
    async fn test_rotation_cycles_every_entry_once_in_order() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let mut seen = Vec::new();
        for i in 0..3u32 {
            let now = 1_000 + i as EpochMillis * 6 * HOUR_MS;
            dispatcher.fire("6h", WakeSource::Timer, now).await.unwrap();
            seen.push(sink.last.lock().clone().unwrap().title);
        }
        assert_eq!(seen, vec!["entry 0", "entry 1", "entry 2"]);

        // Back to the original index after pool-length fires.
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.rotation_for("6h"), 0);
    }

    #[tokio::test]
    async fn test_unknown_channel_is_not_found() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, _) = build(store);

        let err = dispatcher.fire("2h", WakeSource::Manual, 1_000).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_welcome_fires_once_per_calendar_day() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let outcome = dispatcher
            .fire_welcome(WakeSource::Manual, "Mon Jan 01 2024")
            .await
            .unwrap();
        assert_eq!(outcome, FireOutcome::Fired);
        assert_eq!(sink.last.lock().clone().unwrap().tag, "nudge-welcome");

        // Same day, any number of checks: no-op.
        for _ in 0..3 {
            let outcome = dispatcher
                .fire_welcome(WakeSource::Timer, "Mon Jan 01 2024")
                .await
                .unwrap();
            assert_eq!(outcome, FireOutcome::NotDue);
        }
        assert_eq!(sink.presented.load(Ordering::SeqCst), 1);

        // Next day fires again.
        let outcome = dispatcher
            .fire_welcome(WakeSource::Timer, "Tue Jan 02 2024")
            .await
            .unwrap();
        assert_eq!(outcome, FireOutcome::Fired);
    }

    #[tokio::test]
    async fn test_lost_save_race_reapplies_exactly_one_increment() {
        let store = Arc::new(RacingStore {
            inner: MemoryStateStore::new(),
            raced: AtomicBool::new(false),
        });
        let (dispatcher, sink) = build(store.clone());

        let outcome = dispatcher.fire("6h", WakeSource::Sync, 1_000).await.unwrap();
        assert_eq!(outcome, FireOutcome::Fired);
        assert_eq!(sink.presented.load(Ordering::SeqCst), 1);

        // Competing writer advanced 0→1; this fire's display re-applies on
        // top: 1→2. Two successful fires, index advanced exactly twice.
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.rotation_for("6h"), 2);
        assert_eq!(loaded.state.last_fired_for("6h"), 1_000);
    }

    #[tokio::test]
    async fn test_concurrent_checks_fire_at_most_once() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.fire("6h", WakeSource::Timer, 5_000).await.unwrap()
            }));
        }

        let mut fired = 0;
        for handle in handles {
            if handle.await.unwrap() == FireOutcome::Fired {
                fired += 1;
            }
        }

        assert_eq!(fired, 1);
        assert_eq!(sink.presented.load(Ordering::SeqCst), 1);
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.rotation_for("6h"), 1);
    }

    #[tokio::test]
    async fn test_check_all_covers_channels_and_welcome() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let now = Local::now();
        let fired = dispatcher.check_all(WakeSource::Timer, now).await;
        assert_eq!(fired, 2); // one channel + welcome
        assert_eq!(sink.presented.load(Ordering::SeqCst), 2);

        // Immediately re-checking fires nothing.
        let fired = dispatcher.check_all(WakeSource::Timer, now).await;
        assert_eq!(fired, 0);
    }

    #[tokio::test]
    async fn test_reset_makes_everything_due_again() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, _) = build(store.clone());

        dispatcher.fire("6h", WakeSource::Manual, 1_000).await.unwrap();
        dispatcher.reset().await.unwrap();

        let report = dispatcher.status(2_000).await.unwrap();
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].last_fired, 0);
        assert!(report.channels[0].due_now);
        assert!(report.last_welcome_date.is_none());
    }

    #[tokio::test]
    async fn test_status_reports_next_due_time() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, _) = build(store.clone());

        dispatcher.fire("6h", WakeSource::Manual, 1_000).await.unwrap();

        let report = dispatcher.status(2_000).await.unwrap();
        let status = &report.channels[0];
        assert_eq!(status.last_fired, 1_000);
        assert_eq!(status.next_due_at, 1_000 + 6 * HOUR_MS);
        assert!(!status.due_now);
    }

    #[tokio::test]
    async fn test_push_resolves_overrides_without_touching_state() {
        let store = Arc::new(MemoryStateStore::new());
        let (dispatcher, sink) = build(store.clone());

        let overrides = NotificationOverrides {
            title: Some("Server says hi".to_string()),
            tag: Some("campaign-42".to_string()),
            ..Default::default()
        };
        let resolved = dispatcher.push(&overrides).await.unwrap();
        assert_eq!(resolved.title, "Server says hi");
        assert_eq!(resolved.tag, "campaign-42");
        assert_eq!(resolved.body, "You have a new notification.");
        assert_eq!(sink.presented.load(Ordering::SeqCst), 1);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, VersionedState::default());
    }
}
