use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::browser::{PageRenderer, RendererFactory};
use crate::errors::{RenderFeedError, RenderFeedResult};

const PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;

/// A headless browser page driven over the WebDriver wire protocol
/// (chromedriver, geckodriver and friends all speak it).
pub struct WebDriverRenderer {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

#[derive(Deserialize)]
struct NewSessionResponse {
    value: NewSessionValue,
}

#[derive(Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Deserialize)]
struct StringValueResponse {
    value: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    value: ErrorValue,
}

#[derive(Deserialize)]
struct ErrorValue {
    error: String,
    message: String,
}

impl WebDriverRenderer {
    pub fn new(webdriver_url: &str) -> RenderFeedResult<Self> {
        let base_url = webdriver_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        let payload = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--disable-gpu"]
                    }
                }
            }
        });

        let response = client
            .post(format!("{}/session", base_url))
            .json(&payload)
            .send()?;
        let response = Self::check(response)?;
        let session: NewSessionResponse = response
            .json()
            .map_err(|e| RenderFeedError::Render(format!("malformed session response: {}", e)))?;

        let renderer = Self {
            client,
            base_url,
            session_id: session.value.session_id,
            closed: false,
        };

        // Bound how long a single navigation may take before the driver
        // reports a timeout error back to us.
        let timeouts = json!({ "pageLoad": PAGE_LOAD_TIMEOUT_MS });
        let response = renderer
            .client
            .post(renderer.endpoint("timeouts"))
            .json(&timeouts)
            .send()?;
        Self::check(response)?;

        Ok(renderer)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.session_id, path)
    }

    /// Turn a non-2xx WebDriver response into a render error carrying the
    /// driver's own diagnostic.
    fn check(
        response: reqwest::blocking::Response,
    ) -> RenderFeedResult<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorResponse>()
            .map(|e| format!("{}: {}", e.value.error, e.value.message))
            .unwrap_or_else(|_| format!("status {}", status));

        if detail.contains("timeout") {
            Err(RenderFeedError::RenderTimeout(detail))
        } else {
            Err(RenderFeedError::Render(detail))
        }
    }
}

impl PageRenderer for WebDriverRenderer {
    fn open(&mut self, url: &Url) -> RenderFeedResult<()> {
        let payload = json!({ "url": url.as_str() });
        let response = self
            .client
            .post(self.endpoint("url"))
            .json(&payload)
            .send()?;
        Self::check(response)?;
        Ok(())
    }

    fn current_markup(&mut self) -> RenderFeedResult<String> {
        let response = self.client.get(self.endpoint("source")).send()?;
        let response = Self::check(response)?;
        let source: StringValueResponse = response
            .json()
            .map_err(|e| RenderFeedError::Render(format!("malformed source response: {}", e)))?;
        Ok(source.value)
    }

    fn close(&mut self) -> RenderFeedResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self.client.delete(url).send()?;
        Self::check(response)?;
        Ok(())
    }
}

impl Drop for WebDriverRenderer {
    fn drop(&mut self) {
        // Backstop for sessions that were never closed explicitly.
        if !self.closed {
            self.closed = true;
            let url = format!("{}/session/{}", self.base_url, self.session_id);
            let _ = self.client.delete(url).send();
        }
    }
}

pub struct WebDriverFactory {
    webdriver_url: String,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
        }
    }
}

impl RendererFactory for WebDriverFactory {
    fn create(&self) -> RenderFeedResult<Box<dyn PageRenderer>> {
        Ok(Box::new(WebDriverRenderer::new(&self.webdriver_url)?))
    }
}
