//! Wake timer — the single externally-driven polling loop.
//!
//! All periodic liveness comes from here: the loop repeatedly runs a full
//! scheduling pass and never depends on any single pass completing. An
//! abandoned or failed check only delays work until the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use nudge_common::types::WakeSource;

use crate::dispatcher::Dispatcher;

pub struct Ticker {
    dispatcher: Arc<Dispatcher>,
    check_interval: Duration,
}

impl Ticker {
    pub fn new(dispatcher: Arc<Dispatcher>, check_interval_secs: u64) -> Self {
        Self {
            dispatcher,
            check_interval: Duration::from_secs(check_interval_secs),
        }
    }

    /// Start the polling loop. Runs indefinitely until the task is cancelled.
    ///
    /// The first pass runs immediately: a fresh installation greets the user
    /// without waiting a full check interval.
    pub async fn run(&self) {
        tracing::info!(
            check_interval_secs = self.check_interval.as_secs(),
            "Wake timer started"
        );

        loop {
            let fired = self
                .dispatcher
                .check_all(WakeSource::Timer, Local::now())
                .await;

            if fired > 0 {
                tracing::info!(fired, "Scheduling pass complete");
            } else {
                tracing::debug!("Scheduling pass complete; nothing due");
            }

            tokio::time::sleep(self.check_interval).await;
        }
    }
}
