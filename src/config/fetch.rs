//! Page fetching configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::render::{RenderConfig, DEFAULT_USER_AGENT};

/// Page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connection timeout (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum response size (bytes)
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
    /// Maximum redirects to follow per request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Run browser-backed renderers without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Skip images, fonts, and styles in browser-backed renderers
    #[serde(default = "default_fast_mode")]
    pub fast_mode: bool,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_content_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_max_redirects() -> usize {
    10
}

fn default_headless() -> bool {
    true
}

fn default_fast_mode() -> bool {
    true
}

impl FetchConfig {
    /// Convert into the renderer's own config type.
    pub fn to_render_config(&self) -> RenderConfig {
        RenderConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_content_size: self.max_content_size,
            max_redirects: self.max_redirects,
            headless: self.headless,
            fast_mode: self.fast_mode,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_content_size: default_max_content_size(),
            max_redirects: default_max_redirects(),
            headless: default_headless(),
            fast_mode: default_fast_mode(),
        }
    }
}
