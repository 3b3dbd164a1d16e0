use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use quotesync_core::{
    FileKeyValueStore, KeyValueStore, QuoteStore, QuoteViewer, SharedQuoteStore, SyncConfig,
    SyncEngine, SyncScheduler,
};
use quotesync_remote::QuoteApiClient;

use crate::config::AppConfig;

/// Everything a command needs, wired once per process.
pub struct AppContext {
    pub config: AppConfig,
    pub store: SharedQuoteStore,
    pub viewer: QuoteViewer,
    pub engine: Arc<SyncEngine>,
    pub scheduler: SyncScheduler,
}

impl AppContext {
    /// Open the durable slots under `config.data_dir` and wire the sync engine.
    ///
    /// `session` backs the last-viewed slot; its lifetime defines the session.
    pub fn open(config: AppConfig, session: Arc<dyn KeyValueStore>) -> Result<Self> {
        let durable: Arc<dyn KeyValueStore> = Arc::new(
            FileKeyValueStore::open(&config.data_dir).with_context(|| {
                format!("Failed to open data directory {}", config.data_dir.display())
            })?,
        );
        let store = QuoteStore::load(durable.clone()).context("Failed to load quotes")?;
        let store: SharedQuoteStore = Arc::new(Mutex::new(store));

        let client =
            QuoteApiClient::new(&config.server_url).context("Failed to build HTTP client")?;
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            Arc::new(client),
            SyncConfig {
                fetch_limit: config.fetch_limit,
                policy: config.conflict_policy,
            },
        ));

        Ok(Self {
            viewer: QuoteViewer::new(durable, session),
            scheduler: SyncScheduler::new(config.sync_interval),
            config,
            store,
            engine,
        })
    }

    /// Session slot for one-shot commands: a directory under the temp dir.
    pub fn file_session(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
        let store = FileKeyValueStore::open(&config.session_dir).with_context(|| {
            format!(
                "Failed to open session directory {}",
                config.session_dir.display()
            )
        })?;
        Ok(Arc::new(store))
    }
}
