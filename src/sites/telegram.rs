use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::browser::{wait_for_element, PageRenderer, DEFAULT_WAIT_TICKS};
use crate::errors::{RenderFeedError, RenderFeedResult};

/// Render an embedded Telegram post into a tidy blockquote by loading the
/// widget page in the shared browser session.
///
/// Never fails: when the widget cannot be rendered or parsed, a fallback
/// blockquote pointing at the post URL is returned instead.
pub fn render_telegram_embed(embed_url: &str, renderer: &mut dyn PageRenderer) -> String {
    match try_render(embed_url, renderer) {
        Ok(html) => html,
        Err(_) => format!(
            "<blockquote><p>FAILED PARSING TELEGRAM MESSAGE</p><p>{}</p></blockquote>",
            embed_url
        ),
    }
}

fn try_render(embed_url: &str, renderer: &mut dyn PageRenderer) -> RenderFeedResult<String> {
    let url =
        Url::parse(embed_url).map_err(|_| RenderFeedError::InvalidUrl(embed_url.to_string()))?;

    renderer.open(&url)?;
    let markup = wait_for_element(renderer, "div.tgme_widget_message", DEFAULT_WAIT_TICKS)?;

    let document = Html::parse_document(&markup);
    let widget = select_first(document.root_element(), "div.tgme_widget_message")
        .ok_or_else(|| RenderFeedError::Render("telegram widget not in markup".to_string()))?;

    let text_html = select_first(widget, "div.tgme_widget_message_text")
        .map(|t| t.html())
        .unwrap_or_default();

    let link_anchor = select_first(widget, "div.tgme_widget_message_link")
        .and_then(|link| select_first(link, "a"))
        .ok_or_else(|| RenderFeedError::Render("telegram widget has no post link".to_string()))?;
    let link_url = link_anchor
        .value()
        .attr("href")
        .ok_or_else(|| RenderFeedError::Render("telegram post link has no href".to_string()))?
        .to_string();
    let link_html = link_anchor.html();

    let author = select_first(widget, "a.tgme_widget_message_owner_name")
        .map(|a| a.text().collect::<String>())
        .unwrap_or_default();

    let mut media_warning = String::new();

    let mut video_html = String::new();
    if select_first(widget, "a.tgme_widget_message_video_player").is_some() {
        let style = select_first(widget, "i.tgme_widget_message_video_thumb")
            .and_then(|thumb| thumb.value().attr("style"))
            .ok_or_else(|| RenderFeedError::Render("video thumb missing".to_string()))?;
        let thumb_url = background_image_url(style)
            .ok_or_else(|| RenderFeedError::Render("video thumb has no image".to_string()))?;
        video_html = format!(
            "<p><a href='{}' target='_blank'><img src='{}'/></a>",
            link_url, thumb_url
        );
        media_warning = format!("<a href='{}' target='_blank'>[VIDEO]</a> ", link_url);
    }

    let mut image_html = String::new();
    if let Some(photo) = select_first(widget, "a.tgme_widget_message_photo_wrap") {
        if let Some(group) = select_first(widget, "div.tgme_widget_message_grouped") {
            // Media gallery: show the first photo and link the rest.
            let style = select_first(group, "a.tgme_widget_message_photo_wrap")
                .and_then(|p| p.value().attr("style"))
                .ok_or_else(|| RenderFeedError::Render("gallery photo missing".to_string()))?;
            let photo_url = background_image_url(style)
                .ok_or_else(|| RenderFeedError::Render("gallery photo has no image".to_string()))?;
            image_html = format!(
                "<p><a href='{}' target='_blank'><img src='{}'/><br></a></p>",
                link_url, photo_url
            );
            media_warning = format!("<a href='{}' target='_blank'>[GALLERY]</a> ", link_url);
        } else {
            let style = photo
                .value()
                .attr("style")
                .ok_or_else(|| RenderFeedError::Render("photo has no style".to_string()))?;
            let photo_url = background_image_url(style)
                .ok_or_else(|| RenderFeedError::Render("photo has no image".to_string()))?;
            image_html = format!("<img src='{}'/><br>", photo_url);
        }
    }

    Ok(format!(
        "<blockquote>{}{}<p>{}{}</p><p>{} - {}</p></blockquote>",
        image_html, video_html, media_warning, text_html, author, link_html
    ))
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).unwrap();
    scope.select(&selector).next()
}

/// Telegram serves photos as CSS backgrounds; pull the URL back out.
fn background_image_url(style: &str) -> Option<String> {
    let re = Regex::new(r#"background-image:.*url\(['"]([^'"]*)['"]\)"#).unwrap();
    re.captures(style).map(|caps| caps[1].to_string())
}
