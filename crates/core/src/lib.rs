//! Core domain logic for quotesync.
//!
//! The quote store and its persistence slots, random display with category
//! filtering, import/export, and reconciliation with a remote collection.

pub mod errors;
pub mod quotes;
pub mod storage;
pub mod sync;
pub mod viewer;

pub use errors::{QuoteError, Result};
pub use quotes::{AddOutcome, Origin, QuoteId, QuoteRecord, QuoteStore};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use sync::{RemoteTransport, SharedQuoteStore, SyncConfig, SyncEngine, SyncScheduler};
pub use viewer::{CategoryFilter, Pick, QuoteViewer};
