use async_trait::async_trait;

use crate::errors::Result;
use crate::quotes::QuoteRecord;

/// Network access to the remote quote collection.
///
/// Implementations map remote items into the remote identifier namespace, so
/// fetched records can never collide with locally minted identifiers.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Fetch at most `limit` remote records (server default when `None`).
    async fn fetch_quotes(&self, limit: Option<usize>) -> Result<Vec<QuoteRecord>>;

    /// Transmit one record and return the identifier the remote assigned to it
    /// (without namespace prefix).
    async fn push_quote(&self, record: &QuoteRecord) -> Result<String>;
}
