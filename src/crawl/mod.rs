//! Crawl subsystem: frontier, worker pool and URL scoping
//!
//! A crawl starts from a single seed URL and visits every reachable page on
//! the seed's domain, subject to an optional page cap. The pieces:
//! - `Frontier` / `SharedFrontier`: deduplicating FIFO work queue with cap
//!   accounting and end-of-work detection
//! - `CrawlCoordinator`: fixed pool of async workers driving the
//!   fetch -> extract -> analyze pipeline
//! - `CrawlScope`: decides which discovered URLs belong to the crawl
//! - `normalize_url`: canonical form used for deduplication

pub mod coordinator;
pub mod frontier;

pub use coordinator::{CrawlCoordinator, CrawlOutcome, CrawlStats};
pub use frontier::{EnqueueOutcome, Frontier, SharedFrontier};

use thiserror::Error;
use url::Url;

use crate::render::RenderError;

/// Tracking/session query parameters to strip during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "sid",
    "sessionid",
    "ref",
    "source",
];

/// Fatal crawl setup errors. Per-page failures are not errors at this level;
/// they are tallied in [`CrawlStats`] and the crawl continues.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL cannot anchor a crawl.
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// The configured worker pool is empty.
    #[error("worker_count must be positive")]
    NoWorkers,

    /// The seed itself could not be rendered. Nothing was crawled.
    #[error("seed {url} could not be rendered: {source}")]
    SeedUnreachable { url: Url, source: RenderError },

    /// An exclude pattern from configuration failed to compile.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// A unit of crawl work: one URL and how many hops it sits from the seed.
///
/// Depth is diagnostic. It never affects queue order, and only bounds
/// admission when `crawl.max_depth` is set.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Decides which URLs belong to a crawl: same domain as the seed, a
/// crawlable scheme, not an asset download, not matching an exclude pattern.
#[derive(Debug)]
pub struct CrawlScope {
    host: String,
    skip_extensions: Vec<String>,
    exclude_patterns: Vec<regex::Regex>,
}

impl CrawlScope {
    /// Build the scope anchoring a crawl at `seed`'s host.
    ///
    /// Hosts are compared with the `www.` prefix stripped, so
    /// `www.example.com` and `example.com` count as one domain.
    pub fn for_seed(
        seed: &Url,
        skip_extensions: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, CrawlError> {
        if !matches!(seed.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidSeed {
                url: seed.to_string(),
                reason: format!("scheme '{}' is not crawlable", seed.scheme()),
            });
        }
        let host = seed.host_str().ok_or_else(|| CrawlError::InvalidSeed {
            url: seed.to_string(),
            reason: "URL has no host".to_string(),
        })?;

        let mut compiled = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            let re = regex::Regex::new(pattern).map_err(|source| CrawlError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            compiled.push(re);
        }

        Ok(Self {
            host: strip_www(host).to_lowercase(),
            skip_extensions: skip_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            exclude_patterns: compiled,
        })
    }

    /// The normalized host this crawl is anchored to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` belongs to this crawl.
    pub fn admits(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        if !strip_www(host).eq_ignore_ascii_case(&self.host) {
            return false;
        }

        // Extension check runs on the path only, so a query parameter that
        // happens to end in ".pdf" does not knock out a page.
        let path = url.path().to_lowercase();
        if self.skip_extensions.iter().any(|ext| path.ends_with(ext)) {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|re| re.is_match(url.as_str()))
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Normalize a URL for deduplication
///
/// - Strips fragments
/// - Removes `www.` prefix from hostnames
/// - Removes trailing slashes from non-root paths
/// - Strips tracking/session query parameters
/// - Sorts remaining query parameters
/// - Lowercases the result
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();

    normalized.set_fragment(None);

    if let Some(host) = normalized.host_str().map(|h| h.to_string()) {
        if let Some(stripped) = host.strip_prefix("www.") {
            if let Err(e) = normalized.set_host(Some(stripped)) {
                tracing::warn!("Failed to strip www. from {}: {}", host, e);
            }
        }
    }

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        normalized.set_path(&path[..path.len() - 1]);
    }

    if let Some(query) = normalized.query() {
        let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
            .collect();

        if pairs.is_empty() {
            normalized.set_query(None);
        } else {
            pairs.sort();
            let rebuilt = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            normalized.set_query(Some(&rebuilt));
        }
    }

    normalized.as_str().to_lowercase()
}
