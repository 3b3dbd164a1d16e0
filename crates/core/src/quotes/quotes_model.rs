//! Quote domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{QuoteError, Result};

/// Prefix of identifiers minted on this device.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Prefix of identifiers assigned by the remote collection.
pub const REMOTE_ID_PREFIX: &str = "server-";

/// Record identifier, namespaced by who assigned it.
///
/// Serialized as `local-<token>` or `server-<remote id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QuoteId {
    Local(String),
    Remote(String),
}

impl QuoteId {
    /// Mint a fresh local identifier.
    pub fn new_local() -> Self {
        Self::Local(Uuid::new_v4().to_string())
    }

    pub fn remote(id: impl Into<String>) -> Self {
        Self::Remote(id.into())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The identifier without its namespace prefix.
    pub fn raw(&self) -> &str {
        match self {
            Self::Local(raw) | Self::Remote(raw) => raw,
        }
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(raw) => write!(f, "{}{}", LOCAL_ID_PREFIX, raw),
            Self::Remote(raw) => write!(f, "{}{}", REMOTE_ID_PREFIX, raw),
        }
    }
}

impl FromStr for QuoteId {
    type Err = QuoteError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        let parsed = if let Some(raw) = value.strip_prefix(LOCAL_ID_PREFIX) {
            Some(Self::Local(raw.to_string()))
        } else {
            value
                .strip_prefix(REMOTE_ID_PREFIX)
                .map(|raw| Self::Remote(raw.to_string()))
        };

        match parsed {
            Some(id) if !id.raw().is_empty() => Ok(id),
            _ => Err(QuoteError::validation(format!(
                "Invalid quote id '{}': expected '{}' or '{}' prefix",
                value, LOCAL_ID_PREFIX, REMOTE_ID_PREFIX
            ))),
        }
    }
}

impl TryFrom<String> for QuoteId {
    type Error = QuoteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<QuoteId> for String {
    fn from(id: QuoteId) -> Self {
        id.to_string()
    }
}

/// Whether a record's authoritative copy is local-only or reconciled with remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "server", alias = "remote")]
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "server",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quote entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: QuoteId,
    pub text: String,
    pub category: String,
    #[serde(rename = "source", alias = "origin")]
    pub origin: Origin,
    #[serde(
        rename = "updatedAt",
        alias = "lastModified",
        with = "chrono::serde::ts_milliseconds"
    )]
    pub last_modified: DateTime<Utc>,
}

impl QuoteRecord {
    /// New local-origin record with a fresh identifier.
    pub fn new_local(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: QuoteId::new_local(),
            text: text.into(),
            category: category.into(),
            origin: Origin::Local,
            last_modified: Utc::now(),
        }
    }

    /// New remote-origin record as mapped from the server.
    pub fn new_remote(
        remote_id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: QuoteId::remote(remote_id),
            text: text.into(),
            category: category.into(),
            origin: Origin::Remote,
            last_modified: Utc::now(),
        }
    }

    /// Same `(text, category)` pair.
    pub fn has_content(&self, text: &str, category: &str) -> bool {
        self.text == text && self.category == category
    }

    pub fn same_content(&self, other: &QuoteRecord) -> bool {
        self.has_content(&other.text, &other.category)
    }

    /// Candidate for a push: local origin and a locally minted id.
    pub fn is_local_only(&self) -> bool {
        self.origin == Origin::Local && !self.id.is_remote()
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }
}

/// Trim and check user-supplied content.
pub fn validate_content(text: &str, category: &str) -> Result<(String, String)> {
    let text = text.trim();
    let category = category.trim();
    if text.is_empty() {
        return Err(QuoteError::validation("Quote text must not be empty"));
    }
    if category.is_empty() {
        return Err(QuoteError::validation("Quote category must not be empty"));
    }
    Ok((text.to_string(), category.to_string()))
}

/// Result of adding one quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(QuoteRecord),
    /// An identical `(text, category)` pair already exists; nothing changed.
    Duplicate,
}
