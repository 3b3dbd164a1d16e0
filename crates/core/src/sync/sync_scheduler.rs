//! Recurring background trigger for sync cycles.

use log::{debug, info};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::sync_engine::SyncEngine;
use super::sync_model::SyncCycleStatus;

/// Foreground pull cadence in seconds.
pub const SYNC_FOREGROUND_INTERVAL_SECS: u64 = 30;

/// Delay before the first background cycle.
pub const SYNC_INITIAL_DELAY_SECS: u64 = 2;

/// Maximum jitter (seconds) added to periodic cycle intervals.
pub const SYNC_INTERVAL_JITTER_SECS: u64 = 3;

/// Exponential backoff in seconds with cap.
pub fn backoff_seconds(consecutive_failures: u32) -> u64 {
    const MAX_EXPONENT: u32 = 6;
    const BASE_DELAY_SECONDS: u64 = 5;

    2_u64.pow(consecutive_failures.min(MAX_EXPONENT)) * BASE_DELAY_SECONDS
}

/// Delay before the next cycle. Failures can only lengthen the interval.
pub fn next_delay(interval: Duration, consecutive_failures: u32, jitter: Duration) -> Duration {
    let base = if consecutive_failures == 0 {
        interval
    } else {
        interval.max(Duration::from_secs(backoff_seconds(consecutive_failures)))
    };
    base + jitter
}

fn random_jitter() -> Duration {
    let bound_ms = SYNC_INTERVAL_JITTER_SECS.saturating_mul(1000);
    if bound_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=bound_ms))
}

/// Owns the background sync loop.
#[derive(Debug)]
pub struct SyncScheduler {
    interval: Duration,
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(SYNC_FOREGROUND_INTERVAL_SECS))
    }
}

impl SyncScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            background_task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the loop unless one is already running.
    pub async fn ensure_started(&self, engine: Arc<SyncEngine>) {
        let mut guard = self.background_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            guard.take();
        }

        let interval = self.interval;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(SYNC_INITIAL_DELAY_SECS)).await;
            let mut consecutive_failures: u32 = 0;
            loop {
                let result = engine.run_sync_cycle().await;
                match result.status {
                    SyncCycleStatus::Ok => consecutive_failures = 0,
                    SyncCycleStatus::Skipped => {}
                    SyncCycleStatus::FetchError | SyncCycleStatus::MergeError => {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                    }
                }

                let delay = next_delay(interval, consecutive_failures, random_jitter());
                debug!(
                    "[Sync] Background cycle status={:?} failures={} next in {}ms",
                    result.status,
                    consecutive_failures,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        });
        info!(
            "[Sync] Background sync started (every {}s)",
            interval.as_secs()
        );
        *guard = Some(handle);
    }

    /// Abort the loop if it is running.
    pub async fn stop(&self) {
        if let Some(handle) = self.background_task.lock().await.take() {
            handle.abort();
            info!("[Sync] Background sync stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.background_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
