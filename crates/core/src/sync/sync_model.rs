//! Sync domain models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quotes::{QuoteId, QuoteRecord};

/// Default number of remote records requested per fetch.
pub const DEFAULT_FETCH_LIMIT: usize = 20;

/// How a merge pass treats records whose content differs on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Overwrite local content immediately; conflicts are kept for review only.
    #[default]
    RemoteWins,
    /// Leave local content alone until each conflict is resolved.
    Manual,
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "remote_wins" | "remote-wins" | "server_wins" => Ok(Self::RemoteWins),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown conflict policy '{}'", other)),
        }
    }
}

/// Same identifier on both sides, different content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub id: QuoteId,
    pub local_version: QuoteRecord,
    pub remote_version: QuoteRecord,
}

/// Counts produced by one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Remote records that had no local counterpart.
    pub added: usize,
    /// Remote records already present locally and refreshed.
    pub updated: usize,
    pub conflicts: Vec<ConflictRecord>,
}

/// Counts produced by one push pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub pushed: usize,
    pub failed: usize,
}

/// Human-readable phase indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Fetching,
    Merging,
    Pushing,
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Sync: idle"),
            Self::Fetching => f.write_str("Sync: fetching..."),
            Self::Merging => f.write_str("Sync: merging..."),
            Self::Pushing => f.write_str("Sync: pushing local changes..."),
            Self::Error(message) => write!(f, "Sync: error ({})", message),
        }
    }
}

/// Final state of one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleStatus {
    Ok,
    /// Another cycle was already in flight.
    Skipped,
    FetchError,
    MergeError,
}

impl SyncCycleStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchError | Self::MergeError)
    }
}

/// Cycle report returned to callers and logged by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCycleResult {
    pub status: SyncCycleStatus,
    pub pulled_count: usize,
    pub added_count: usize,
    pub conflict_count: usize,
    pub pushed_count: usize,
    pub push_failed_count: usize,
    pub duration_ms: i64,
    pub error: Option<String>,
}

impl SyncCycleResult {
    pub(crate) fn new(status: SyncCycleStatus) -> Self {
        Self {
            status,
            pulled_count: 0,
            added_count: 0,
            conflict_count: 0,
            pushed_count: 0,
            push_failed_count: 0,
            duration_ms: 0,
            error: None,
        }
    }
}
