use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{RenderFeedError, RenderFeedResult};

/// One upstream feed item waiting to be rendered into a full article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub link: Url,
    pub title: String,
    pub published_raw: Option<String>,
}

impl Entry {
    pub fn new(link: Url, title: String) -> Self {
        Self {
            link,
            title,
            published_raw: None,
        }
    }

    pub fn with_published(mut self, published_raw: Option<String>) -> Self {
        self.published_raw = published_raw;
        self
    }

    /// Parse the upstream timestamp. Feeds carry either RFC 3339 or RFC 2822
    /// dates; anything else fails the entry.
    pub fn published_at(&self) -> RenderFeedResult<DateTime<Utc>> {
        let raw = self
            .published_raw
            .as_deref()
            .ok_or_else(|| RenderFeedError::PublishedDate("missing".to_string()))?;

        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| RenderFeedError::PublishedDate(raw.to_string()))
    }
}
