use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rendered article as persisted in the content cache.
///
/// Rows are immutable once written: the pipeline only inserts after a
/// confirmed cache miss, and rows disappear only through pruning or a flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedArticle {
    /// Article URL, the primary key.
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub body: String,
}

impl CachedArticle {
    pub fn new(
        id: String,
        title: String,
        published_at: DateTime<Utc>,
        author: Option<String>,
        body: String,
    ) -> Self {
        Self {
            id,
            title,
            published_at,
            author,
            body,
        }
    }
}
