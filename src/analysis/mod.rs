//! Page analysis: tokenization, categorization and language tagging
//!
//! [`PageAnalyzer::analyze`] is pure: no I/O, no clock, no randomness. Given
//! the same URL, text and links it always produces the same [`PageResult`].
//! The boilerplate math over collections of results lives in
//! [`boilerplate`] and [`differential`].

pub mod boilerplate;
pub mod differential;
pub mod language;

pub use boilerplate::{BoilerplateProfile, DEFAULT_THRESHOLD};
pub use differential::CategoryProfiles;
pub use language::{LanguageDetector, UrlLanguageDetector};

use std::collections::HashMap;

use url::Url;

/// Category assigned to pages at the site root.
pub const ROOT_CATEGORY: &str = "root";
/// Language tag for pages whose language could not be determined.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Word-level summary of one crawled page.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The URL the page was crawled as.
    pub url: Url,
    /// Site section, from the first meaningful path segment.
    pub category: String,
    /// Language tag, or [`UNKNOWN_LANGUAGE`].
    pub language: String,
    /// Occurrences per token.
    pub word_counts: HashMap<String, u32>,
    /// Sum over all occurrences, not distinct tokens.
    pub total_words: u64,
    /// Links found on the page, already resolved.
    pub discovered_links: Vec<Url>,
}

/// Turns raw page text into a [`PageResult`].
pub struct PageAnalyzer {
    skip_numeric_tokens: bool,
    language: Box<dyn LanguageDetector>,
}

impl PageAnalyzer {
    pub fn new(skip_numeric_tokens: bool, language: Box<dyn LanguageDetector>) -> Self {
        Self {
            skip_numeric_tokens,
            language,
        }
    }

    pub fn analyze(&self, url: &Url, text: &str, links: Vec<Url>) -> PageResult {
        let (word_counts, total_words) = self.count_words(text);
        let language = self
            .language
            .detect(url, text)
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

        PageResult {
            url: url.clone(),
            category: categorize(url),
            language,
            word_counts,
            total_words,
            discovered_links: links,
        }
    }

    fn count_words(&self, text: &str) -> (HashMap<String, u32>, u64) {
        let mut counts: HashMap<String, u32> = HashMap::new();
        let mut total = 0u64;

        for token in tokenize(text) {
            if self.skip_numeric_tokens && token.chars().all(|c| c.is_numeric()) {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
            total += 1;
        }

        (counts, total)
    }
}

/// Split text into lowercased tokens on every non-alphanumeric character.
///
/// Unicode-aware: "blåbær" survives as one token. Apostrophes split, so
/// "it's" becomes "it" and "s". Lowercasing happens after the split to keep
/// multi-char lowercase expansions inside their token.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Site section of a URL: the first path segment that is not a language
/// selector, lowercased. Root URLs map to [`ROOT_CATEGORY`]; if every
/// segment is a language selector the first one is used as-is.
pub fn categorize(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|iter| iter.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.is_empty() {
        return ROOT_CATEGORY.to_string();
    }

    for segment in &segments {
        if language::segment_language(segment).is_none() {
            return segment.to_lowercase();
        }
    }
    segments[0].to_lowercase()
}
