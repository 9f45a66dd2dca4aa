//! Page rendering abstraction
//!
//! A renderer turns a URL into HTML. The production implementation is plain
//! HTTP ([`HttpRenderer`]); the trait seam exists so a headless-browser
//! renderer can slot in for JS-heavy sites, and so tests can drive the crawl
//! pipeline with a scripted in-memory site.

pub mod http;

pub use http::HttpRenderer;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Default user agent advertised by the HTTP renderer.
pub const DEFAULT_USER_AGENT: &str = "BoilerscanBot/0.1 (+https://github.com/boilerscan/boilerscan)";

/// Errors that can occur while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    BadStatus(u16),
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(usize),
}

/// A successfully rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Raw markup of the page
    pub html: String,
    /// The URL the response actually came from (differs from the request
    /// after redirects). Links must be resolved against this.
    pub final_url: Url,
    /// Time taken to produce the page
    pub fetch_duration: Duration,
}

/// Configuration shared by renderer implementations
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Run a browser-backed renderer without a visible window. The HTTP
    /// renderer fetches markup only and ignores this.
    pub headless: bool,
    /// Skip images/fonts/styles in a browser-backed renderer. The HTTP
    /// renderer never downloads subresources, so this is a no-op there.
    pub fast_mode: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_content_size: 10 * 1024 * 1024, // 10 MB
            max_redirects: 10,
            headless: true,
            fast_mode: true,
        }
    }
}

/// Turns a URL into HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError>;
}
