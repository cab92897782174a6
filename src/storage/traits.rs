use crate::domain::CachedArticle;
use crate::errors::RenderFeedResult;

/// The content cache: one durable table of rendered articles per site,
/// keyed by article URL.
#[cfg_attr(test, mockall::automock)]
pub trait ArticleCacheRepository: Send + Sync {
    /// Point read by article URL. Absence is not an error.
    fn lookup(&self, url: &str) -> RenderFeedResult<Option<CachedArticle>>;

    /// Persist a freshly rendered article. Inserting a URL that is already
    /// cached is a silent no-op; the first row wins.
    fn insert(&self, article: &CachedArticle) -> RenderFeedResult<()>;

    /// Evict the oldest rows (by publish time) beyond `max_entries`.
    /// Returns how many rows were removed.
    fn prune(&self, max_entries: usize) -> RenderFeedResult<usize>;

    /// Delete every cached row for this site.
    fn flush(&self) -> RenderFeedResult<()>;
}
