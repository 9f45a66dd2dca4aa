//! Crawl scope and worker pool configuration

use serde::{Deserialize, Serialize};

/// Crawl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Number of concurrent crawl workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Politeness delay after each processed page (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Maximum pages to crawl, 0 for unlimited
    #[serde(default)]
    pub max_pages: u64,
    /// Maximum link depth from the seed, 0 for unlimited
    #[serde(default)]
    pub max_depth: u32,
    /// File extensions that are never fetched (binary and asset URLs)
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
    /// URL patterns to exclude (regular expressions)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_worker_count() -> usize {
    5
}

fn default_delay_ms() -> u64 {
    100
}

fn default_skip_extensions() -> Vec<String> {
    [
        ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".zip", ".tar", ".gz", ".mp4",
        ".mp3", ".avi", ".mov", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".css", ".js",
        ".xml", ".json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            delay_ms: default_delay_ms(),
            max_pages: 0,
            max_depth: 0,
            skip_extensions: default_skip_extensions(),
            exclude_patterns: Vec::new(),
        }
    }
}
