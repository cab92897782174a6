use feed_rs::parser;
use reqwest::blocking::Client;
use tracing::warn;
use url::Url;

use crate::domain::{Entry, SourceFeed, SourceMeta};
use crate::errors::{RenderFeedError, RenderFeedResult};

/// Reads a site's upstream feed and normalizes it into the entry list the
/// pipeline works on. Entry order is the document order of the feed.
pub struct SourceFeedReader {
    client: Client,
}

impl SourceFeedReader {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn fetch(&self, feed_url: &str) -> RenderFeedResult<SourceFeed> {
        let response = self.client.get(feed_url).send()?;
        let bytes = response.bytes()?;

        parse_source_feed(&bytes)
    }
}

impl Default for SourceFeedReader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_source_feed(bytes: &[u8]) -> RenderFeedResult<SourceFeed> {
    let parsed = parser::parse(bytes).map_err(|e| RenderFeedError::FeedParse(e.to_string()))?;

    let meta = SourceMeta {
        title: parsed
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_else(|| "Untitled feed".to_string()),
        link: parsed
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default(),
        description: parsed
            .description
            .as_ref()
            .map(|d| d.content.clone())
            .unwrap_or_default(),
        language: parsed.language.clone(),
    };

    let mut entries = Vec::new();
    for entry in parsed.entries {
        let href = match entry.links.first() {
            Some(l) => l.href.clone(),
            None => {
                warn!(id = %entry.id, "upstream entry has no link, dropping it");
                continue;
            }
        };
        let link = match Url::parse(&href) {
            Ok(url) => url,
            Err(_) => {
                warn!(link = %href, "upstream entry link is not a valid URL, dropping it");
                continue;
            }
        };

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        let published_raw = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339());

        entries.push(Entry::new(link, title).with_published(published_raw));
    }

    Ok(SourceFeed { meta, entries })
}
