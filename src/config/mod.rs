//! Configuration for boilerscan

mod analysis;
mod crawl;
mod fetch;
mod logging;

pub use analysis::{AnalysisConfig, ReportConfig, ReportFormat};
pub use crawl::CrawlConfig;
pub use fetch::FetchConfig;
pub use logging::{LogLevel, LoggingConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a boilerscan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Crawl configuration
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Page fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Word analysis configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Report output configuration
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            fetch: FetchConfig::default(),
            analysis: AnalysisConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Crawl validation
        if self.crawl.worker_count == 0 {
            errors.push("worker_count must be positive".to_string());
        }
        for ext in &self.crawl.skip_extensions {
            if !ext.starts_with('.') {
                errors.push(format!("skip extension '{}' must start with '.'", ext));
            }
        }
        for pattern in &self.crawl.exclude_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(format!("invalid exclude pattern '{}': {}", pattern, e));
            }
        }

        // Fetch validation
        if self.fetch.user_agent.is_empty() {
            errors.push("user_agent must not be empty".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("timeout_secs must be positive".to_string());
        }
        if self.fetch.max_content_size == 0 {
            errors.push("max_content_size must be positive".to_string());
        }

        // Analysis validation
        if self.analysis.boilerplate_threshold <= 0.0 || self.analysis.boilerplate_threshold > 1.0
        {
            errors.push(
                "boilerplate_threshold must be between 0.0 (exclusive) and 1.0".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
