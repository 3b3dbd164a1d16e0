//! Sync cycle engine: fetch, merge, push and conflict resolution.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};

use super::merge::merge;
use super::sync_model::{
    ConflictPolicy, ConflictRecord, MergeOutcome, PushOutcome, SyncCycleResult, SyncCycleStatus,
    SyncStatus, DEFAULT_FETCH_LIMIT,
};
use super::transport::RemoteTransport;
use crate::errors::{QuoteError, Result};
use crate::quotes::{Origin, QuoteId, QuoteRecord, QuoteStore, ReassignOutcome};

/// The store as shared between the engine and interactive callers.
pub type SharedQuoteStore = Arc<Mutex<QuoteStore>>;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub fetch_limit: Option<usize>,
    pub policy: ConflictPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_limit: Some(DEFAULT_FETCH_LIMIT),
            policy: ConflictPolicy::default(),
        }
    }
}

/// Reconciles the shared store with the remote collection.
///
/// At most one cycle runs at a time; a cycle requested while another is in
/// flight is skipped.
pub struct SyncEngine {
    store: SharedQuoteStore,
    transport: Arc<dyn RemoteTransport>,
    config: SyncConfig,
    conflicts: Mutex<Vec<ConflictRecord>>,
    status: watch::Sender<SyncStatus>,
    cycle_mutex: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        store: SharedQuoteStore,
        transport: Arc<dyn RemoteTransport>,
        config: SyncConfig,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            store,
            transport,
            config,
            conflicts: Mutex::new(Vec::new()),
            status,
            cycle_mutex: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SharedQuoteStore {
        &self.store
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Observe status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: SyncStatus) {
        debug!("[Sync] {}", status);
        self.status.send_replace(status);
    }

    pub async fn pending_conflicts(&self) -> Vec<ConflictRecord> {
        self.conflicts.lock().await.clone()
    }

    /// Fetch the remote list. Never touches the store.
    pub async fn fetch_remote(&self) -> Result<Vec<QuoteRecord>> {
        let remote = self.transport.fetch_quotes(self.config.fetch_limit).await?;
        if let Some(stray) = remote.iter().find(|r| !r.id.is_remote()) {
            return Err(QuoteError::transport(
                format!("remote record {} is outside the remote namespace", stray.id),
                false,
            ));
        }
        Ok(remote)
    }

    /// Merge `remote` into the store and replace the pending conflicts.
    pub async fn merge_remote(&self, remote: &[QuoteRecord]) -> Result<MergeOutcome> {
        let outcome = {
            let mut store = self.store.lock().await;
            merge(&mut store, remote, self.config.policy)?
        };
        *self.conflicts.lock().await = outcome.conflicts.clone();
        if !outcome.conflicts.is_empty() {
            info!(
                "[Sync] {} conflict(s) detected ({})",
                outcome.conflicts.len(),
                match self.config.policy {
                    ConflictPolicy::RemoteWins => "server changes applied by default",
                    ConflictPolicy::Manual => "awaiting resolution",
                }
            );
        }
        Ok(outcome)
    }

    /// Transmit every local-only record; failures are per item.
    ///
    /// The store lock is not held across network calls. Each pushed record is
    /// looked up again by its local id before it is moved into the remote
    /// namespace, so concurrent adds and removals are not lost.
    pub async fn push_local_only(&self) -> PushOutcome {
        let candidates: Vec<QuoteRecord> = {
            let store = self.store.lock().await;
            store
                .all()
                .iter()
                .filter(|q| q.is_local_only())
                .cloned()
                .collect()
        };

        let mut outcome = PushOutcome::default();
        for record in candidates {
            let remote_raw = match self.transport.push_quote(&record).await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("[Sync] Failed to push {}: {}", record.id, err);
                    outcome.failed += 1;
                    continue;
                }
            };

            let remote_id = QuoteId::remote(remote_raw);
            let mut store = self.store.lock().await;
            match store.reassign_remote_id(&record.id, remote_id.clone(), None) {
                Ok(ReassignOutcome::Reassigned) => {
                    debug!("[Sync] pushed {} as {}", record.id, remote_id);
                    outcome.pushed += 1;
                }
                Ok(ReassignOutcome::Missing) => {
                    debug!("[Sync] {} was removed while being pushed", record.id);
                }
                Ok(ReassignOutcome::IdInUse) => {
                    warn!(
                        "[Sync] Remote assigned {} to {} but it is already used locally",
                        remote_id, record.id
                    );
                    outcome.failed += 1;
                }
                Err(err) => {
                    warn!("[Sync] Failed to record push of {}: {}", record.id, err);
                    outcome.failed += 1;
                }
            }
        }

        if outcome.pushed > 0 {
            info!("[Sync] {} local item(s) pushed to server", outcome.pushed);
        }
        outcome
    }

    /// One fetch → merge → push cycle.
    ///
    /// Fetch or merge failures end the cycle with an error status and leave
    /// the store as it was; push failures only count against the push phase.
    pub async fn run_sync_cycle(&self) -> SyncCycleResult {
        let Ok(_cycle_guard) = self.cycle_mutex.try_lock() else {
            debug!("[Sync] Cycle already in flight; skipping");
            return SyncCycleResult::new(SyncCycleStatus::Skipped);
        };
        let started_at = Instant::now();
        let mut result = SyncCycleResult::new(SyncCycleStatus::Ok);

        self.set_status(SyncStatus::Fetching);
        let remote = match self.fetch_remote().await {
            Ok(remote) => remote,
            Err(err) => return self.fail(result, SyncCycleStatus::FetchError, err, started_at),
        };
        result.pulled_count = remote.len();

        self.set_status(SyncStatus::Merging);
        let merged = match self.merge_remote(&remote).await {
            Ok(merged) => merged,
            Err(err) => return self.fail(result, SyncCycleStatus::MergeError, err, started_at),
        };
        result.added_count = merged.added;
        result.conflict_count = merged.conflicts.len();

        self.set_status(SyncStatus::Pushing);
        let pushed = self.push_local_only().await;
        result.pushed_count = pushed.pushed;
        result.push_failed_count = pushed.failed;

        self.set_status(SyncStatus::Idle);
        result.duration_ms = started_at.elapsed().as_millis() as i64;
        info!(
            "[Sync] Cycle complete pulled={} added={} conflicts={} pushed={} push_failed={}",
            result.pulled_count,
            result.added_count,
            result.conflict_count,
            result.pushed_count,
            result.push_failed_count
        );
        result
    }

    fn fail(
        &self,
        mut result: SyncCycleResult,
        status: SyncCycleStatus,
        err: QuoteError,
        started_at: Instant,
    ) -> SyncCycleResult {
        warn!("[Sync] Cycle failed ({:?}): {}", status, err);
        self.set_status(SyncStatus::Error(err.to_string()));
        result.status = status;
        result.error = Some(err.to_string());
        result.duration_ms = started_at.elapsed().as_millis() as i64;
        result
    }

    async fn pending_conflict(&self, id: &QuoteId) -> Result<ConflictRecord> {
        self.conflicts
            .lock()
            .await
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| QuoteError::not_found(format!("No pending conflict for {}", id)))
    }

    async fn clear_conflict(&self, id: &QuoteId) {
        self.conflicts.lock().await.retain(|c| &c.id != id);
    }

    /// Resolve a conflict in favour of the remote version.
    pub async fn accept_remote(&self, id: &QuoteId) -> Result<()> {
        let conflict = self.pending_conflict(id).await?;

        if self.config.policy == ConflictPolicy::Manual {
            let mut store = self.store.lock().await;
            if let Some(index) = store.position(id) {
                let remote = &conflict.remote_version;
                let local = &mut store.records_mut()[index];
                local.text = remote.text.clone();
                local.category = remote.category.clone();
                local.origin = Origin::Remote;
                local.last_modified = remote.last_modified;
                store.commit()?;
            }
        }

        self.clear_conflict(id).await;
        info!("[Sync] Server version accepted for {}", id);
        Ok(())
    }

    /// Resolve a conflict in favour of the local version.
    ///
    /// The local content is transmitted as a new remote record; on success the
    /// local record takes that content and the newly assigned identifier. On
    /// failure the conflict stays pending.
    pub async fn keep_local(&self, id: &QuoteId) -> Result<QuoteRecord> {
        let conflict = self.pending_conflict(id).await?;
        let local = conflict.local_version;

        let remote_id = QuoteId::remote(self.transport.push_quote(&local).await?);

        let resolved = {
            let mut store = self.store.lock().await;
            let content = Some((local.text.clone(), local.category.clone()));
            match store.reassign_remote_id(id, remote_id.clone(), content)? {
                ReassignOutcome::Reassigned => store.get(&remote_id).cloned(),
                ReassignOutcome::Missing => None,
                ReassignOutcome::IdInUse => {
                    return Err(QuoteError::transport(
                        format!("Remote assigned {} which is already used locally", remote_id),
                        false,
                    ));
                }
            }
        };

        self.clear_conflict(id).await;
        let record = resolved
            .ok_or_else(|| QuoteError::not_found(format!("Quote {} no longer exists", id)))?;
        info!("[Sync] Local kept for {} and pushed as {}", id, remote_id);
        Ok(record)
    }
}
