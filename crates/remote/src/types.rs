//! Wire types of the remote posts collection.

use quotesync_core::QuoteRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of a post title kept as the quote category.
pub const CATEGORY_FROM_TITLE_CHARS: usize = 20;

/// Characters of a category sent as the post title.
pub const TITLE_FROM_CATEGORY_CHARS: usize = 50;

/// Category given to posts without a usable title.
pub const FALLBACK_CATEGORY: &str = "Server";

/// Author id attached to every created post.
pub const DEFAULT_USER_ID: i64 = 1;

/// Remote identifier; the collection may use numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemotePostId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RemotePostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One item of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: RemotePostId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

impl RemotePost {
    /// Map into a remote-namespace quote.
    ///
    /// The body becomes the text (falling back to the title) and the start of
    /// the title becomes the category.
    pub fn into_record(self) -> QuoteRecord {
        let id = self.id.to_string();
        let text = non_blank(&self.body)
            .or_else(|| non_blank(&self.title))
            .map(str::to_string)
            .unwrap_or_else(|| format!("server post {}", id));
        let category = non_blank(&self.title)
            .map(|title| truncate_chars(title, CATEGORY_FROM_TITLE_CHARS))
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

        QuoteRecord::new_remote(id, text, category)
    }
}

/// Payload of `POST` on the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub user_id: i64,
}

impl CreatePostRequest {
    pub fn from_record(record: &QuoteRecord) -> Self {
        Self {
            title: truncate_chars(&record.category, TITLE_FROM_CATEGORY_CHARS),
            body: record.text.clone(),
            user_id: DEFAULT_USER_ID,
        }
    }
}

/// Response of `POST` on the collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePostResponse {
    pub id: RemotePostId,
}
