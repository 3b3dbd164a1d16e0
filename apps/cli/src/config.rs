//! Configuration management

use anyhow::{Context, Result};
use quotesync_core::sync::{ConflictPolicy, DEFAULT_FETCH_LIMIT, SYNC_FOREGROUND_INTERVAL_SECS};
use quotesync_remote::DEFAULT_SERVER_URL;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = ".quotesync";
const SESSION_DIR_NAME: &str = "quotesync-session";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the durable slots (quotes, selected category)
    pub data_dir: PathBuf,

    /// Directory holding the session slot for one-shot commands
    pub session_dir: PathBuf,

    /// Remote collection URL
    pub server_url: String,

    /// Background sync cadence
    pub sync_interval: Duration,

    /// Remote records requested per fetch (`None` = server default)
    pub fetch_limit: Option<usize>,

    pub conflict_policy: ConflictPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = var("QUOTESYNC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let session_dir = var("QUOTESYNC_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(SESSION_DIR_NAME));

        let server_url = var("QUOTESYNC_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let sync_interval_secs = match var("QUOTESYNC_SYNC_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("QUOTESYNC_SYNC_INTERVAL_SECS must be a positive integer, got '{}'", raw))?,
            None => SYNC_FOREGROUND_INTERVAL_SECS,
        };

        let fetch_limit = match var("QUOTESYNC_FETCH_LIMIT") {
            Some(raw) => {
                let limit = raw
                    .parse::<usize>()
                    .with_context(|| format!("QUOTESYNC_FETCH_LIMIT must be an integer, got '{}'", raw))?;
                (limit > 0).then_some(limit)
            }
            None => Some(DEFAULT_FETCH_LIMIT),
        };

        let conflict_policy = match var("QUOTESYNC_CONFLICT_POLICY") {
            Some(raw) => raw
                .parse::<ConflictPolicy>()
                .map_err(anyhow::Error::msg)
                .context("Invalid QUOTESYNC_CONFLICT_POLICY")?,
            None => ConflictPolicy::default(),
        };

        Ok(Self {
            data_dir,
            session_dir,
            server_url,
            sync_interval: Duration::from_secs(sync_interval_secs),
            fetch_limit,
            conflict_policy,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, server_url: Option<String>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(url) = server_url {
            self.server_url = url;
        }
        self
    }
}
