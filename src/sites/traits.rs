use crate::browser::PageRenderer;
use crate::errors::RenderFeedResult;

/// Normalized article fields produced by a site strategy. The title comes
/// from the upstream feed entry, not from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFields {
    pub author: Option<String>,
    pub body: String,
}

/// What a strategy decided about one rendered page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Article(ArticleFields),
    /// The entry does not belong in the feed (unsupported content kind).
    /// Skipped entries are excluded from the output instead of retried.
    Skip,
}

/// Publisher-specific extraction rules.
///
/// `extract` is a best-effort document transform: missing optional fragments
/// are dropped silently, and only the absence of the required article-body
/// container is an error. Strategies may drive `renderer` to resolve nested
/// embeds, but must not assume the original page is still loaded afterwards.
pub trait SiteStrategy: Send + Sync {
    /// Registry name, also the feed identifier and the cache table name.
    fn name(&self) -> &'static str;

    /// The upstream feed this site's entries come from.
    fn feed_url(&self) -> &'static str;

    /// How many entries to accept when the caller does not pass a limit.
    /// `None` means the whole upstream feed.
    fn default_limit(&self) -> Option<usize>;

    /// CSS selector of the container that must be present before the page
    /// counts as rendered.
    fn article_selector(&self) -> &'static str;

    fn extract(
        &self,
        markup: &str,
        renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<Extraction>;
}
