//! Durable scheduling state.
//!
//! The scheduler's entire persisted footprint is one small JSON record kept
//! under a fixed key. Saves are compare-and-swap on a version stamp:
//! concurrent load-modify-save cycles can never apply a lost update, they
//! lose the swap and retry against the fresh record instead.
//!
//! Uses a Redis Lua script so the version check and both writes are one
//! atomic server-side step.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use nudge_common::error::AppError;
use nudge_common::types::NotificationState;

/// Fixed record name for the persisted state.
pub const STATE_KEY: &str = "nudge:notify:state";
/// Version stamp, bumped on every applied save.
pub const STATE_VERSION_KEY: &str = "nudge:notify:state:ver";

/// A loaded state plus the version stamp to present on save.
/// An absent record is the zero-value state at version 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedState {
    pub state: NotificationState,
    pub version: u64,
}

/// Durable store for the single scheduling record.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state. Absence is a valid zero state, not an error.
    async fn load(&self) -> Result<VersionedState, AppError>;

    /// Compare-and-swap save: writes only if the stored version still equals
    /// `expected_version`. Returns whether the write was applied.
    async fn save(
        &self,
        state: &NotificationState,
        expected_version: u64,
    ) -> Result<bool, AppError>;

    /// Clear the persisted state back to defaults.
    async fn reset(&self) -> Result<(), AppError>;
}

// GET version, compare, SET record + bump version — atomic on the server.
const CAS_SCRIPT: &str = r#"
local ver = tonumber(redis.call('GET', KEYS[2]) or '0')
if ver == tonumber(ARGV[1]) then
    redis.call('SET', KEYS[1], ARGV[2])
    redis.call('SET', KEYS[2], ver + 1)
    return 1
end
return 0
"#;

/// Redis-backed state store.
pub struct RedisStateStore {
    redis: ConnectionManager,
    cas: redis::Script,
}

impl RedisStateStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            cas: redis::Script::new(CAS_SCRIPT),
        }
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn load(&self) -> Result<VersionedState, AppError> {
        let mut conn = self.redis.clone();
        let (raw, version): (Option<String>, Option<u64>) = redis::pipe()
            .get(STATE_KEY)
            .get(STATE_VERSION_KEY)
            .query_async(&mut conn)
            .await?;
        let version = version.unwrap_or(0);

        // Keep the stored version even when the record is absent, otherwise
        // a leftover version stamp would make every save lose its swap.
        let Some(raw) = raw else {
            return Ok(VersionedState {
                state: NotificationState::default(),
                version,
            });
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(VersionedState { state, version }),
            Err(e) => {
                // Unreadable history degrades to "never fired": worst case is
                // one extra immediate fire, never a crash. Drop the record so
                // the next save starts from version 0 again.
                tracing::warn!(error = %e, "Discarding unreadable state record");
                let _: () = redis::pipe()
                    .del(STATE_KEY)
                    .del(STATE_VERSION_KEY)
                    .query_async(&mut conn)
                    .await?;
                Ok(VersionedState::default())
            }
        }
    }

    async fn save(
        &self,
        state: &NotificationState,
        expected_version: u64,
    ) -> Result<bool, AppError> {
        let payload = serde_json::to_string(state)
            .map_err(|e| AppError::Decode(format!("state encode: {e}")))?;

        let mut conn = self.redis.clone();
        let applied: i32 = self
            .cas
            .key(STATE_KEY)
            .key(STATE_VERSION_KEY)
            .arg(expected_version)
            .arg(payload)
            .invoke_async(&mut conn)
            .await?;

        if applied == 0 {
            tracing::debug!(expected_version, "State save lost the version race");
        }

        Ok(applied == 1)
    }

    async fn reset(&self) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        let _: () = redis::pipe()
            .del(STATE_KEY)
            .del(STATE_VERSION_KEY)
            .query_async(&mut conn)
            .await?;

        tracing::info!("Notification state cleared");
        Ok(())
    }
}

/// In-process state store with the same compare-and-swap semantics.
/// Used by tests and webhook-less local runs.
#[derive(Default)]
pub struct MemoryStateStore {
    inner: parking_lot::Mutex<VersionedState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<VersionedState, AppError> {
        Ok(self.inner.lock().clone())
    }

    async fn save(
        &self,
        state: &NotificationState,
        expected_version: u64,
    ) -> Result<bool, AppError> {
        let mut guard = self.inner.lock();
        if guard.version != expected_version {
            return Ok(false);
        }
        guard.state = state.clone();
        guard.version += 1;
        Ok(true)
    }

    async fn reset(&self) -> Result<(), AppError> {
        *self.inner.lock() = VersionedState::default();
        Ok(())
    }
}
