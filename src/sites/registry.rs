use crate::browser::PageRenderer;
use crate::errors::RenderFeedResult;
use crate::sites::il_post::IlPost;
use crate::sites::nasa_iotd::NasaIotd;
use crate::sites::traits::{Extraction, SiteStrategy};

/// The closed set of publishers this binary knows how to render.
pub enum SiteParser {
    NasaIotd(NasaIotd),
    IlPost(IlPost),
}

impl SiteStrategy for SiteParser {
    fn name(&self) -> &'static str {
        match self {
            SiteParser::NasaIotd(site) => site.name(),
            SiteParser::IlPost(site) => site.name(),
        }
    }

    fn feed_url(&self) -> &'static str {
        match self {
            SiteParser::NasaIotd(site) => site.feed_url(),
            SiteParser::IlPost(site) => site.feed_url(),
        }
    }

    fn default_limit(&self) -> Option<usize> {
        match self {
            SiteParser::NasaIotd(site) => site.default_limit(),
            SiteParser::IlPost(site) => site.default_limit(),
        }
    }

    fn article_selector(&self) -> &'static str {
        match self {
            SiteParser::NasaIotd(site) => site.article_selector(),
            SiteParser::IlPost(site) => site.article_selector(),
        }
    }

    fn extract(
        &self,
        markup: &str,
        renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<Extraction> {
        match self {
            SiteParser::NasaIotd(site) => site.extract(markup, renderer),
            SiteParser::IlPost(site) => site.extract(markup, renderer),
        }
    }
}

/// Explicit list of active sites, built once at startup and passed by
/// reference to whoever routes feed identifiers.
pub struct SiteRegistry {
    sites: Vec<SiteParser>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self {
            sites: vec![
                SiteParser::NasaIotd(NasaIotd::new()),
                SiteParser::IlPost(IlPost::new()),
            ],
        }
    }

    /// Resolve a feed identifier to its site.
    pub fn find(&self, feed_id: &str) -> Option<&SiteParser> {
        self.sites.iter().find(|site| site.name() == feed_id)
    }

    pub fn all(&self) -> &[SiteParser] {
        &self.sites
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sites.iter().map(|site| site.name()).collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
