use chrono::Utc;
use tracing::{info, warn};

use crate::browser::{PageRenderer, RendererFactory};
use crate::domain::{FeedDocument, FeedItem, SourceFeed};
use crate::errors::RenderFeedResult;
use crate::services::entry_processor::{EntryProcessor, ProcessedEntry};
use crate::sites::SiteStrategy;
use crate::storage::ArticleCacheRepository;

/// Drives the entry processor over a source feed and packages the results.
///
/// One render session serves the whole batch; entries are processed strictly
/// sequentially because a browser session cannot navigate concurrently.
pub struct FeedAssembler<'a, C: ArticleCacheRepository, F: RendererFactory> {
    cache: &'a C,
    renderer_factory: &'a F,
}

impl<'a, C: ArticleCacheRepository, F: RendererFactory> FeedAssembler<'a, C, F> {
    pub fn new(cache: &'a C, renderer_factory: &'a F) -> Self {
        Self {
            cache,
            renderer_factory,
        }
    }

    /// Build the output document for one site. `limit` counts accepted
    /// items; skipped entries don't use it up.
    pub fn assemble(
        &self,
        site: &dyn SiteStrategy,
        source: &SourceFeed,
        limit: Option<usize>,
    ) -> RenderFeedResult<FeedDocument> {
        let mut renderer = self.renderer_factory.create()?;

        let collected = self.collect_items(site, &mut *renderer, source, limit);

        // The session dies with the batch, whatever happened inside.
        if let Err(err) = renderer.close() {
            warn!(error = %err, "failed to close the render session");
        }

        let items = collected?;

        Ok(FeedDocument {
            meta: source.meta.clone(),
            last_build_date: Utc::now(),
            items,
        })
    }

    fn collect_items(
        &self,
        site: &dyn SiteStrategy,
        renderer: &mut dyn PageRenderer,
        source: &SourceFeed,
        limit: Option<usize>,
    ) -> RenderFeedResult<Vec<FeedItem>> {
        let processor = EntryProcessor::new(self.cache, site);
        let mut items = Vec::new();

        for entry in &source.entries {
            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }

            match processor.process(entry, renderer)? {
                ProcessedEntry::Accepted(item) => items.push(item),
                ProcessedEntry::Skipped => {
                    info!(link = %entry.link, "entry skipped by site rules");
                }
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::PageRenderer;
    use crate::domain::{Entry, SourceMeta};
    use crate::errors::RenderFeedError;
    use crate::sites::{ArticleFields, Extraction};
    use crate::storage::sqlite::{SqliteArticleCacheRepository, SqliteStorage};
    use crate::storage::traits::MockArticleCacheRepository;
    use std::sync::{Arc, Mutex};
    use url::Url;

    #[derive(Default)]
    struct SpyState {
        opens: usize,
        closes: usize,
    }

    /// Renderer handed out by the spy factory; markup echoes the last
    /// opened URL so sites can react per entry.
    struct SpyRenderer {
        state: Arc<Mutex<SpyState>>,
        markup: String,
    }

    impl PageRenderer for SpyRenderer {
        fn open(&mut self, url: &Url) -> RenderFeedResult<()> {
            self.state.lock().unwrap().opens += 1;
            self.markup = format!("<html><body><article>{}</article></body></html>", url);
            Ok(())
        }

        fn current_markup(&mut self) -> RenderFeedResult<String> {
            Ok(self.markup.clone())
        }

        fn close(&mut self) -> RenderFeedResult<()> {
            self.state.lock().unwrap().closes += 1;
            Ok(())
        }
    }

    struct SpyFactory {
        state: Arc<Mutex<SpyState>>,
    }

    impl SpyFactory {
        fn new() -> (Self, Arc<Mutex<SpyState>>) {
            let state = Arc::new(Mutex::new(SpyState::default()));
            (
                Self {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl RendererFactory for SpyFactory {
        fn create(&self) -> RenderFeedResult<Box<dyn PageRenderer>> {
            Ok(Box::new(SpyRenderer {
                state: self.state.clone(),
                markup: String::new(),
            }))
        }
    }

    /// Accepts every entry, skipping those whose URL contains `skip_marker`,
    /// failing those whose URL contains `fail_marker`.
    struct ScriptedSite {
        skip_marker: &'static str,
        fail_marker: &'static str,
    }

    impl ScriptedSite {
        fn accept_all() -> Self {
            Self {
                skip_marker: "\u{0}",
                fail_marker: "\u{0}",
            }
        }
    }

    impl SiteStrategy for ScriptedSite {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn feed_url(&self) -> &'static str {
            "https://example.com/feed"
        }
        fn default_limit(&self) -> Option<usize> {
            None
        }
        fn article_selector(&self) -> &'static str {
            "article"
        }
        fn extract(
            &self,
            markup: &str,
            _renderer: &mut dyn PageRenderer,
        ) -> RenderFeedResult<Extraction> {
            if markup.contains(self.fail_marker) {
                return Err(RenderFeedError::MissingArticleBody("#body".to_string()));
            }
            if markup.contains(self.skip_marker) {
                return Ok(Extraction::Skip);
            }
            Ok(Extraction::Article(ArticleFields {
                author: None,
                body: format!("<p>{}</p>", markup.len()),
            }))
        }
    }

    fn cache() -> SqliteArticleCacheRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteArticleCacheRepository::new(storage, "test_site").unwrap()
    }

    fn source(paths: &[&str]) -> SourceFeed {
        SourceFeed {
            meta: SourceMeta {
                title: "Example".to_string(),
                link: "https://example.com".to_string(),
                description: "Example feed".to_string(),
                language: Some("en".to_string()),
            },
            entries: paths
                .iter()
                .map(|p| {
                    Entry::new(
                        Url::parse(&format!("https://example.com/{}", p)).unwrap(),
                        format!("Entry {}", p),
                    )
                    .with_published(Some("2025-03-01T08:00:00+00:00".to_string()))
                })
                .collect(),
        }
    }

    fn links(document: &FeedDocument) -> Vec<String> {
        document
            .items
            .iter()
            .map(|item| item.link.to_string())
            .collect()
    }

    #[test]
    fn test_limit_takes_entries_in_order() {
        let cache = cache();
        let (factory, _) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite::accept_all();

        let document = assembler
            .assemble(&site, &source(&["a", "b", "c"]), Some(2))
            .unwrap();

        assert_eq!(
            links(&document),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_skipped_entries_do_not_consume_the_limit() {
        let cache = cache();
        let (factory, _) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite {
            skip_marker: "/b",
            fail_marker: "\u{0}",
        };

        let document = assembler
            .assemble(&site, &source(&["a", "b", "c"]), Some(2))
            .unwrap();

        assert_eq!(
            links(&document),
            vec!["https://example.com/a", "https://example.com/c"]
        );
    }

    #[test]
    fn test_no_limit_processes_the_whole_feed() {
        let cache = cache();
        let (factory, _) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite::accept_all();

        let document = assembler
            .assemble(&site, &source(&["a", "b", "c"]), None)
            .unwrap();

        assert_eq!(document.items.len(), 3);
    }

    #[test]
    fn test_renderer_closed_once_on_success() {
        let cache = cache();
        let (factory, state) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite::accept_all();

        assembler
            .assemble(&site, &source(&["a", "b"]), None)
            .unwrap();

        assert_eq!(state.lock().unwrap().opens, 2);
        assert_eq!(state.lock().unwrap().closes, 1);
    }

    #[test]
    fn test_renderer_closed_once_when_entries_break() {
        let cache = cache();
        let (factory, state) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite {
            skip_marker: "\u{0}",
            fail_marker: "/a",
        };

        let document = assembler.assemble(&site, &source(&["a"]), None).unwrap();

        // The batch still completes with a broken item in place.
        assert_eq!(document.items.len(), 1);
        assert_eq!(state.lock().unwrap().closes, 1);
    }

    #[test]
    fn test_renderer_closed_once_when_storage_fails() {
        let mut cache = MockArticleCacheRepository::new();
        cache
            .expect_lookup()
            .returning(|_| Err(RenderFeedError::Database(rusqlite::Error::InvalidQuery)));

        let (factory, state) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite::accept_all();

        assert!(assembler.assemble(&site, &source(&["a"]), None).is_err());
        assert_eq!(state.lock().unwrap().closes, 1);
    }

    #[test]
    fn test_document_carries_source_meta() {
        let cache = cache();
        let (factory, _) = SpyFactory::new();
        let assembler = FeedAssembler::new(&cache, &factory);
        let site = ScriptedSite::accept_all();

        let document = assembler.assemble(&site, &source(&["a"]), None).unwrap();

        assert_eq!(document.meta.title, "Example");
        assert_eq!(document.meta.language.as_deref(), Some("en"));
    }
}
