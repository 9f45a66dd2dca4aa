//! Plain HTTP renderer built on reqwest

use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use super::{PageRenderer, RenderConfig, RenderError, RenderedPage};

/// Fetches pages over plain HTTP. No JavaScript execution; what the server
/// sends is what gets analyzed.
pub struct HttpRenderer {
    client: reqwest::Client,
    config: RenderConfig,
}

impl HttpRenderer {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        if !config.headless {
            tracing::debug!("headless=false only affects browser-backed renderers");
        }

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Only textual content is worth tokenizing.
    fn is_textual(content_type: &str) -> bool {
        content_type.contains("text/html")
            || content_type.contains("application/xhtml")
            || content_type.contains("text/plain")
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError> {
        let start = Instant::now();

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::BadStatus(status.as_u16()));
        }

        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !Self::is_textual(&content_type) {
            return Err(RenderError::InvalidContentType(content_type));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.config.max_content_size {
                return Err(RenderError::ContentTooLarge(len as usize));
            }
        }

        let html = response.text().await?;
        if html.len() > self.config.max_content_size {
            return Err(RenderError::ContentTooLarge(html.len()));
        }

        Ok(RenderedPage {
            html,
            final_url,
            fetch_duration: start.elapsed(),
        })
    }
}
