//! Remote quote collection client.
//!
//! Implements [`quotesync_core::sync::RemoteTransport`] over HTTP with reqwest.

pub mod client;
pub mod error;
pub mod types;

pub use client::{QuoteApiClient, DEFAULT_SERVER_URL};
pub use error::{ApiRetryClass, RemoteError, Result};
pub use types::{CreatePostRequest, CreatePostResponse, RemotePost, RemotePostId};
