use scraper::{ElementRef, Html, Selector};

use crate::browser::PageRenderer;
use crate::errors::{RenderFeedError, RenderFeedResult};
use crate::sites::telegram::render_telegram_embed;
use crate::sites::traits::{ArticleFields, Extraction, SiteStrategy};

/// Il Post. Articles mix plain paragraphs with lazy-loaded images,
/// galleries, embeds and data visualizations; each fragment kind gets its
/// own reader-friendly rendering, and fragments we cannot make sense of are
/// dropped rather than failing the article.
pub struct IlPost;

impl IlPost {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IlPost {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteStrategy for IlPost {
    fn name(&self) -> &'static str {
        "ilpost"
    }

    fn feed_url(&self) -> &'static str {
        "https://www.ilpost.it/feed/"
    }

    fn default_limit(&self) -> Option<usize> {
        Some(10)
    }

    fn article_selector(&self) -> &'static str {
        "article"
    }

    fn extract(
        &self,
        markup: &str,
        renderer: &mut dyn PageRenderer,
    ) -> RenderFeedResult<Extraction> {
        let document = Html::parse_document(markup);

        let article = select_first(document.root_element(), "article")
            .ok_or_else(|| RenderFeedError::MissingArticleBody("article".to_string()))?;

        // Podcast episodes ship an audio player instead of an article body;
        // they don't belong in a text feed.
        if select_first(article, "div.podcast-player").is_some() {
            return Ok(Extraction::Skip);
        }

        let mut description = String::new();

        if let Some(subtitle) = select_first(article, "div.sottit") {
            description.push_str(&subtitle.html());
        }

        // Lead figure above the body.
        if let Some(header) = select_first(article, "div.entry-container") {
            for child in header.children().filter_map(ElementRef::wrap) {
                if child.value().name() == "div"
                    && has_class(child, "figure-container")
                    && has_class(child, "cf")
                {
                    if let Some(src) = select_first(child, "img")
                        .and_then(|img| img.value().attr("data-src"))
                    {
                        let caption = select_first(child, "span.caption")
                            .map(|c| c.text().collect::<String>());
                        description.push_str(&image_with_caption(src, caption.as_deref()));
                    }
                }
            }
        }

        let body = select_first(article, "div#singleBody")
            .or_else(|| select_first(article, "span#singleBody"))
            .ok_or_else(|| RenderFeedError::MissingArticleBody("#singleBody".to_string()))?;

        for child in body.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "p" => match select_first(child, "iframe") {
                    Some(iframe) => {
                        let is_telegram = iframe
                            .value()
                            .attr("id")
                            .is_some_and(|id| id.contains("telegram-post"));
                        match iframe.value().attr("src") {
                            Some(src) if is_telegram => {
                                description.push_str(&render_telegram_embed(src, renderer))
                            }
                            _ => description.push_str(&generic_iframe(iframe)),
                        }
                    }
                    None => description.push_str(&child.html()),
                },
                "img" => {
                    if let Some(src) = child.value().attr("src") {
                        description.push_str(&image_with_caption(src, None));
                    }
                }
                "blockquote" => description.push_str(&child.html()),
                "div" => description.push_str(&div_fragment(child)),
                _ => {}
            }
        }

        Ok(Extraction::Article(ArticleFields {
            author: None,
            body: description,
        }))
    }
}

/// Body-level div fragments: attachments, videos, galleries, live blogs and
/// data embeds. Unknown divs render to nothing.
fn div_fragment(child: ElementRef<'_>) -> String {
    if child
        .value()
        .attr("id")
        .is_some_and(|id| id.contains("attachment"))
    {
        if let Some(src) = select_first(child, "img").and_then(|img| img.value().attr("data-src"))
        {
            let caption: String = child.text().collect();
            return image_with_caption(src, Some(caption.trim()));
        }
        return String::new();
    }

    if has_class(child, "video-container") {
        if let Some(src) = select_first(child, "div.rll-youtube-player")
            .and_then(|yt| yt.value().attr("data-src"))
        {
            return video_placeholder(src);
        }
        return String::new();
    }

    if has_class(child, "gallery") {
        let mut gallery = String::new();
        for inner in child.children().filter_map(ElementRef::wrap) {
            let href = select_first(inner, "a").and_then(|a| a.value().attr("href"));
            let src = select_first(inner, "img").and_then(|img| img.value().attr("data-src"));
            if let (Some(href), Some(src)) = (href, src) {
                gallery.push_str(&gallery_image(href, src));
                gallery.push_str(&format!(
                    "<figure><figcaption><a href='{}' target='_blank'>[GALLERY]</a></figcaption></figure>",
                    href
                ));
            }
        }
        return gallery;
    }

    if has_class(child, "live-center-embed") {
        if let Some(src) = child.value().attr("data-src") {
            return format!(
                "<p><a href='{}'>[[ LIVE BLOG - Click to open a tidy version ]]</a></p>",
                src
            );
        }
        return String::new();
    }

    if has_class(child, "ilpost_datawrapper") {
        return data_wrapper(child);
    }

    if has_class(child, "flourish-embed") {
        return "<p><figure><figcaption>[[ DATA GRAPH - Open the webpage to see it ]]</figcaption></figure></p>"
            .to_string();
    }

    String::new()
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).unwrap();
    scope.select(&selector).next()
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn image_with_caption(url: &str, caption: Option<&str>) -> String {
    // The site serves webp copies that some readers choke on.
    let url = url.replace("jpeg.webp", "jpeg").replace("jpg.webp", "jpg");
    let caption_code = caption
        .filter(|c| !c.is_empty())
        .map(|c| format!("<figcaption>{}</figcaption>", c))
        .unwrap_or_default();
    format!(
        "<figure><picture><img src='{}'/></picture>{}</figure>",
        url, caption_code
    )
}

fn video_placeholder(player_url: &str) -> String {
    let id = player_url.rsplit('/').next().unwrap_or(player_url);
    let watch_url = format!("https://www.youtube.com/watch?v={}", id);
    format!(
        "<figure><picture><a href=\"{}\" target=\"_blank\">\
         <img src=\"https://i.ytimg.com/vi/{}/hqdefault.jpg\"></a></picture>\
         <figcaption>(YouTube video - Click the placeholder to open it)</figcaption></figure>",
        watch_url, id
    )
}

fn gallery_image(href: &str, src: &str) -> String {
    let href = href.replace("jpeg.webp", "jpeg").replace("jpg.webp", "jpg");
    format!(
        "<figure><picture><a href=\"{}\" target=\"_blank\"><img src=\"{}\"></a></picture></figure>",
        href, src
    )
}

fn generic_iframe(iframe: ElementRef<'_>) -> String {
    let url = ["src", "data-url", "data-lazy-src"]
        .into_iter()
        .filter_map(|attr| iframe.value().attr(attr))
        .find(|value| value.starts_with("http"));

    match url {
        Some(url) => format!(
            "<figure><picture><iframe src='{url}'></iframe></picture>\
             <figcaption><a href='{url}'>[[ IFRAME - Click here to see it ]]</a></figcaption></figure>"
        ),
        None => "<p><figure><figcaption>[[ BROKEN IFRAME - Open the webpage to see it ]]</figcaption></figure>"
            .to_string(),
    }
}

fn data_wrapper(div: ElementRef<'_>) -> String {
    match div.value().attr("data-url") {
        Some(url) => format!(
            "<figure><picture><iframe src='{url}'></iframe></picture>\
             <figcaption><a href='{url}'>[[ DATA VISUALIZATION - Open the full page if you can't see it ]]</a></figcaption></figure>"
        ),
        None => "<p><figure><figcaption>[[ BROKEN DATA VISUALIZATION - Open the full page to see it ]]</figcaption></figure>"
            .to_string(),
    }
}
