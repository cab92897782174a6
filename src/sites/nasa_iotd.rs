use scraper::{Html, Selector};

use crate::browser::PageRenderer;
use crate::errors::{RenderFeedError, RenderFeedResult};
use crate::sites::traits::{ArticleFields, Extraction, SiteStrategy};

/// NASA "Image of the Day". The upstream feed carries stubs; the real
/// caption and credits only exist on the rendered page.
pub struct NasaIotd;

impl NasaIotd {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NasaIotd {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteStrategy for NasaIotd {
    fn name(&self) -> &'static str {
        "nasa_iotd"
    }

    fn feed_url(&self) -> &'static str {
        "https://www.nasa.gov/rss/dyn/lg_image_of_the_day.rss"
    }

    fn default_limit(&self) -> Option<usize> {
        None
    }

    fn article_selector(&self) -> &'static str {
        "div.article-body"
    }

    fn extract(
        &self,
        markup: &str,
        _renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<Extraction> {
        let document = Html::parse_document(markup);

        let article_selector = Selector::parse("div.article-body").unwrap();
        let article = document
            .select(&article_selector)
            .next()
            .ok_or_else(|| RenderFeedError::MissingArticleBody("div.article-body".to_string()))?;

        let text_selector = Selector::parse("div.text").unwrap();
        let text = article
            .select(&text_selector)
            .next()
            .ok_or_else(|| {
                RenderFeedError::MissingArticleBody("div.article-body div.text".to_string())
            })?;

        // The feature image links with site-relative hrefs.
        let image_selector = Selector::parse("div.feature-image-container").unwrap();
        let image_html = article
            .select(&image_selector)
            .next()
            .map(|image| {
                image
                    .html()
                    .replace("href=\"/sites", "href=\"https://www.nasa.gov/sites")
            })
            .unwrap_or_default();

        let editor_selector = Selector::parse("div.editor").unwrap();
        let author = text.select(&editor_selector).next().map(|editor| {
            editor
                .text()
                .collect::<String>()
                .replace("Editor: ", "")
                .trim()
                .to_string()
        });

        let body = if image_html.is_empty() {
            text.html()
        } else {
            format!("{}<br>{}", image_html, text.html())
        };

        Ok(Extraction::Article(ArticleFields { author, body }))
    }
}
