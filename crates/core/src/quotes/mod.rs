//! Quote records, the persisted store and import/export.

mod quote_store;
mod quotes_model;
mod transfer;

pub use quote_store::{QuoteStore, DEFAULT_QUOTES};
pub(crate) use quote_store::ReassignOutcome;
pub use quotes_model::*;
pub use transfer::*;
