use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::browser::{wait_for_element, PageRenderer, DEFAULT_WAIT_TICKS};
use crate::domain::{CachedArticle, Entry, FeedItem};
use crate::errors::RenderFeedResult;
use crate::sites::{ArticleFields, Extraction, SiteStrategy};
use crate::storage::ArticleCacheRepository;

pub const MAX_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Outcome of processing one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedEntry {
    Accepted(FeedItem),
    /// The site strategy declared the entry out of scope for the feed.
    Skipped,
}

/// Turns one upstream entry into a feed item: cache hit, fresh render, or a
/// broken placeholder once the retries are spent.
pub struct EntryProcessor<'a, C: ArticleCacheRepository> {
    cache: &'a C,
    site: &'a dyn SiteStrategy,
}

impl<'a, C: ArticleCacheRepository> EntryProcessor<'a, C> {
    pub fn new(cache: &'a C, site: &'a dyn SiteStrategy) -> Self {
        Self { cache, site }
    }

    /// Process one entry.
    ///
    /// Render and extraction failures are retried up to [`MAX_ATTEMPTS`]
    /// with a pause in between, then downgraded to a Broken placeholder
    /// item. The placeholder is never cached, so a later run tries again.
    /// The only errors that escape this method are storage failures.
    pub fn process(
        &self,
        entry: &Entry,
        renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<ProcessedEntry> {
        if let Some(cached) = self.cache.lookup(entry.link.as_str())? {
            return Ok(ProcessedEntry::Accepted(FeedItem::from_cached(entry, &cached)));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(entry, renderer) {
                Ok(None) => return Ok(ProcessedEntry::Skipped),
                Ok(Some((fields, published_at))) => {
                    let article = CachedArticle::new(
                        entry.link.to_string(),
                        entry.title.clone(),
                        published_at,
                        fields.author.clone(),
                        fields.body.clone(),
                    );
                    self.cache.insert(&article)?;

                    return Ok(ProcessedEntry::Accepted(FeedItem::from_extraction(
                        entry,
                        &fields,
                        published_at,
                    )));
                }
                Err(err) if attempts >= MAX_ATTEMPTS => {
                    error!(
                        link = %entry.link,
                        attempts,
                        error = %err,
                        "entry exhausted its retries, emitting a broken item"
                    );
                    return Ok(ProcessedEntry::Accepted(FeedItem::broken(
                        entry,
                        &err.to_string(),
                    )));
                }
                Err(err) => {
                    warn!(
                        link = %entry.link,
                        attempt = attempts,
                        error = %err,
                        "render attempt failed, retrying"
                    );
                    thread::sleep(RETRY_PAUSE);
                }
            }
        }
    }

    /// One render attempt. `None` means the site declared the entry skipped.
    fn attempt(
        &self,
        entry: &Entry,
        renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<Option<(ArticleFields, DateTime<Utc>)>> {
        renderer.open(&entry.link)?;
        let markup = wait_for_element(renderer, self.site.article_selector(), DEFAULT_WAIT_TICKS)?;

        match self.site.extract(&markup, renderer)? {
            Extraction::Skip => Ok(None),
            Extraction::Article(fields) => {
                let published_at = entry.published_at()?;
                Ok(Some((fields, published_at)))
            }
        }
    }
}
