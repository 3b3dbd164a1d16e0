//! Key-value slots backing the store, the category filter and the session.

mod file_store;
mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;

use crate::errors::Result;

/// Slot holding the full quote list.
pub const QUOTES_KEY: &str = "quotes";

/// Slot holding the last selected category filter.
pub const SELECTED_CATEGORY_KEY: &str = "selected_category";

/// Session slot holding the last displayed record.
pub const LAST_QUOTE_KEY: &str = "last_quote";

/// A string-valued key-value store.
///
/// Durable implementations survive restarts; session implementations live as
/// long as the process (or directory) that owns them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
