use chrono::{DateTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{CachedArticle, Entry};
use crate::sites::ArticleFields;

/// Feed-level metadata lifted from the upstream source feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: Option<String>,
}

/// The upstream feed as read by the source feed reader: metadata plus the
/// ordered entry list.
#[derive(Debug, Clone)]
pub struct SourceFeed {
    pub meta: SourceMeta,
    pub entries: Vec<Entry>,
}

pub const BROKEN_TITLE: &str = "BROKEN";

/// One item of the output feed.
///
/// The guid is always the article link (permalink semantics).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: Url,
    pub body: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Item built from a fresh extraction.
    pub fn from_extraction(
        entry: &Entry,
        fields: &ArticleFields,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            body: fields.body.clone(),
            author: fields.author.clone(),
            published_at: Some(published_at),
        }
    }

    /// Item rebuilt from a cache hit.
    pub fn from_cached(entry: &Entry, cached: &CachedArticle) -> Self {
        Self {
            title: cached.title.clone(),
            link: entry.link.clone(),
            body: cached.body.clone(),
            author: cached.author.clone(),
            published_at: Some(cached.published_at),
        }
    }

    /// Placeholder substituted when an entry exhausts its retries. Carries a
    /// human-readable diagnostic instead of real content and is never
    /// cached, so the next run retries the entry.
    pub fn broken(entry: &Entry, error: &str) -> Self {
        let body = format!(
            "<p>[[ BROKEN ENTRY - The article could not be rendered ]]</p>\
             <p><a href='{}'>{}</a></p>\
             <p>{}</p>",
            entry.link, entry.title, error
        );
        Self {
            title: BROKEN_TITLE.to_string(),
            link: entry.link.clone(),
            body,
            author: None,
            published_at: None,
        }
    }

    fn to_rss_item(&self) -> rss::Item {
        let guid = GuidBuilder::default()
            .value(self.link.to_string())
            .permalink(true)
            .build();

        ItemBuilder::default()
            .title(Some(self.title.clone()))
            .link(Some(self.link.to_string()))
            .description(Some(self.body.clone()))
            .author(self.author.clone())
            .guid(Some(guid))
            .pub_date(self.published_at.map(|dt| dt.to_rfc2822()))
            .build()
    }
}

/// The assembled output feed, built once per invocation.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub meta: SourceMeta,
    pub last_build_date: DateTime<Utc>,
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    /// Serialize as RSS 2.0.
    pub fn to_xml(&self) -> String {
        let items: Vec<rss::Item> = self.items.iter().map(FeedItem::to_rss_item).collect();

        let channel = ChannelBuilder::default()
            .title(self.meta.title.clone())
            .link(self.meta.link.clone())
            .description(self.meta.description.clone())
            .language(self.meta.language.clone())
            .last_build_date(Some(self.last_build_date.to_rfc2822()))
            .items(items)
            .build();

        channel.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> Entry {
        Entry::new(
            Url::parse("https://example.com/a1").unwrap(),
            "First article".to_string(),
        )
    }

    fn meta() -> SourceMeta {
        SourceMeta {
            title: "Example".to_string(),
            link: "https://example.com".to_string(),
            description: "Example feed".to_string(),
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn test_broken_item_shape() {
        let item = FeedItem::broken(&entry(), "render timed out");

        assert_eq!(item.title, BROKEN_TITLE);
        assert_eq!(item.link.as_str(), "https://example.com/a1");
        assert!(item.published_at.is_none());
        assert!(item.body.contains("First article"));
        assert!(item.body.contains("render timed out"));
    }

    #[test]
    fn test_document_serializes_items_in_order() {
        let fields = ArticleFields {
            author: Some("Jo Writer".to_string()),
            body: "<p>body one</p>".to_string(),
        };
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let document = FeedDocument {
            meta: meta(),
            last_build_date: Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap(),
            items: vec![
                FeedItem::from_extraction(&entry(), &fields, published),
                FeedItem::broken(&entry(), "boom"),
            ],
        };

        let xml = document.to_xml();
        assert!(xml.contains("<title>Example</title>"));
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.contains("<p>body one</p>") || xml.contains("&lt;p&gt;body one&lt;/p&gt;"));

        let first = xml.find("First article").unwrap();
        let second = xml.find("BROKEN").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_guid_is_the_link() {
        let fields = ArticleFields {
            author: None,
            body: "<p>b</p>".to_string(),
        };
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let item = FeedItem::from_extraction(&entry(), &fields, published).to_rss_item();

        assert_eq!(item.guid().unwrap().value(), "https://example.com/a1");
        assert!(item.guid().unwrap().is_permalink());
    }
}
