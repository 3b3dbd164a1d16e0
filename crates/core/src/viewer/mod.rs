//! Category filtering, random display and the session's last-viewed quote.

use chrono::Local;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::quotes::{QuoteRecord, QuoteStore};
use crate::storage::{KeyValueStore, LAST_QUOTE_KEY, SELECTED_CATEGORY_KEY};

const ALL_CATEGORIES: &str = "all";

/// Which records are eligible for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    /// Parse the persisted form: `"all"` (or blank) selects everything.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Category(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Category(category) => category,
        }
    }

    pub fn matches(&self, record: &QuoteRecord) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => &record.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All Categories"),
            Self::Category(category) => f.write_str(category),
        }
    }
}

/// Result of a random pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Shown(QuoteRecord),
    /// No record matches the filter.
    Empty,
}

/// Display state: the durable filter slot and the session slot.
pub struct QuoteViewer {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl QuoteViewer {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// The saved filter, falling back to `All` when its category no longer exists.
    pub fn current_filter(&self, store: &QuoteStore) -> Result<CategoryFilter> {
        let saved = self
            .durable
            .get(SELECTED_CATEGORY_KEY)?
            .map(|raw| CategoryFilter::parse(&raw))
            .unwrap_or_default();

        match &saved {
            CategoryFilter::Category(category) if !store.categories().contains(category) => {
                debug!("[Viewer] saved category '{}' no longer exists", category);
                Ok(CategoryFilter::All)
            }
            _ => Ok(saved),
        }
    }

    pub fn set_filter(&self, filter: &CategoryFilter) -> Result<()> {
        self.durable.set(SELECTED_CATEGORY_KEY, filter.as_str())
    }

    /// Records eligible under `filter`, in store order.
    pub fn matching<'a>(store: &'a QuoteStore, filter: &CategoryFilter) -> Vec<&'a QuoteRecord> {
        store.all().iter().filter(|q| filter.matches(q)).collect()
    }

    /// Pick uniformly among matching records and remember it for the session.
    pub fn pick_random<R: Rng + ?Sized>(
        &self,
        store: &QuoteStore,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Result<Pick> {
        let pool = Self::matching(store, filter);
        let Some(record) = pool.choose(rng) else {
            return Ok(Pick::Empty);
        };
        let record = (*record).clone();
        self.remember(&record)?;
        Ok(Pick::Shown(record))
    }

    /// Record `record` as the last one shown in this session.
    pub fn remember(&self, record: &QuoteRecord) -> Result<()> {
        let encoded = serde_json::to_string(record)?;
        self.session.set(LAST_QUOTE_KEY, &encoded)
    }

    /// The session's last-shown record, if it still passes `filter`.
    pub fn last_viewed(&self, filter: &CategoryFilter) -> Result<Option<QuoteRecord>> {
        let Some(raw) = self.session.get(LAST_QUOTE_KEY)? else {
            return Ok(None);
        };
        let record = match serde_json::from_str::<QuoteRecord>(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!("[Viewer] ignoring unreadable last quote: {}", err);
                return Ok(None);
            }
        };
        Ok(filter.matches(&record).then_some(record))
    }
}

/// Plain-text rendering of one record.
pub fn render(record: &QuoteRecord) -> String {
    format!(
        "\"{}\"\n— {} ({})\nid: {} • updatedAt: {}",
        record.text,
        record.category,
        record.origin,
        record.id,
        record
            .last_modified
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    )
}
