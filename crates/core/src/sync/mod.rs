//! Sync domain models and services.

mod merge;
mod sync_engine;
mod sync_model;
mod sync_scheduler;
mod transport;

pub use merge::*;
pub use sync_engine::*;
pub use sync_model::*;
pub use sync_scheduler::*;
pub use transport::*;
