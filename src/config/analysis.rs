//! Word analysis and report configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::analysis::DEFAULT_THRESHOLD;

/// Word analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fraction of pages a word must appear on to count as boilerplate
    #[serde(default = "default_boilerplate_threshold")]
    pub boilerplate_threshold: f64,
    /// Also build per-category boilerplate profiles
    #[serde(default = "default_category_diff")]
    pub category_diff: bool,
    /// Drop tokens made entirely of digits
    #[serde(default)]
    pub skip_numeric_tokens: bool,
}

fn default_boilerplate_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_category_diff() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            boilerplate_threshold: default_boilerplate_threshold(),
            category_diff: default_category_diff(),
            skip_numeric_tokens: false,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report format
    #[serde(default = "default_report_format")]
    pub format: ReportFormat,
    /// Write the report to this path as well as stdout
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_report_format() -> ReportFormat {
    ReportFormat::Text
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_report_format(),
            output: None,
        }
    }
}
