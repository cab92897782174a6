pub mod webdriver;

use std::thread;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::errors::{RenderFeedError, RenderFeedResult};

pub use webdriver::{WebDriverFactory, WebDriverRenderer};

/// A live browser page: navigate, snapshot the rendered markup, tear down.
///
/// One session is shared by a whole feed build, so implementations only need
/// to support one page at a time.
#[cfg_attr(test, mockall::automock)]
pub trait PageRenderer {
    fn open(&mut self, url: &Url) -> RenderFeedResult<()>;
    fn current_markup(&mut self) -> RenderFeedResult<String>;
    fn close(&mut self) -> RenderFeedResult<()>;
}

/// Creates one render session per feed build.
pub trait RendererFactory {
    fn create(&self) -> RenderFeedResult<Box<dyn PageRenderer>>;
}

pub const DEFAULT_WAIT_TICKS: u32 = 10;

/// Poll the rendered page until `css` matches something, then return the
/// settled markup.
///
/// The pause grows linearly with the attempt count (0.1s, 0.2s, ...); once
/// the allotted ticks are spent the wait resolves to a timeout error.
pub fn wait_for_element(
    renderer: &mut dyn PageRenderer,
    css: &str,
    ticks: u32,
) -> RenderFeedResult<String> {
    let selector = Selector::parse(css)
        .map_err(|_| RenderFeedError::Render(format!("invalid selector '{}'", css)))?;

    let mut counter: u32 = 1;
    loop {
        let markup = renderer.current_markup()?;
        let document = Html::parse_document(&markup);
        if document.select(&selector).next().is_some() {
            return Ok(markup);
        }

        if counter > ticks {
            return Err(RenderFeedError::RenderTimeout(css.to_string()));
        }
        thread::sleep(Duration::from_millis(100) * counter);
        counter += 1;
    }
}
