//! Boilerplate detection by document frequency
//!
//! A word is boilerplate when it appears on at least `threshold` of the
//! pages in scope. Detection is presence-based: how often a word repeats
//! within one page is irrelevant to whether it is boilerplate. Occurrence
//! counts come back in when measuring how much of a page the boilerplate
//! accounts for, where every occurrence is removed.

use std::collections::HashMap;

use super::PageResult;

/// Fraction of pages a word must appear on to count as boilerplate.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Document-frequency profile over a set of pages.
#[derive(Debug, Clone)]
pub struct BoilerplateProfile {
    page_count: usize,
    threshold: f64,
    /// word -> number of pages containing it at least once
    doc_freq: HashMap<String, u32>,
}

impl BoilerplateProfile {
    /// Build a profile over `pages`. Zero-word pages still count toward the
    /// page total, which lowers every word's document frequency.
    pub fn build<'a, I>(pages: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = &'a PageResult>,
    {
        let mut page_count = 0usize;
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for page in pages {
            page_count += 1;
            for word in page.word_counts.keys() {
                *doc_freq.entry(word.clone()).or_insert(0) += 1;
            }
        }

        Self {
            page_count,
            threshold,
            doc_freq,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `word` clears the document-frequency threshold. With fewer
    /// than two pages nothing is boilerplate: repetition across pages is
    /// the entire signal, and one page cannot repeat.
    pub fn is_boilerplate(&self, word: &str) -> bool {
        if self.page_count < 2 {
            return false;
        }
        match self.doc_freq.get(word) {
            Some(&freq) => freq as f64 / self.page_count as f64 >= self.threshold,
            None => false,
        }
    }

    /// How many words `page` keeps after removing every occurrence of every
    /// boilerplate word.
    pub fn unique_word_count(&self, page: &PageResult) -> u64 {
        if self.page_count < 2 {
            return page.total_words;
        }
        let removed: u64 = page
            .word_counts
            .iter()
            .filter(|(word, _)| self.is_boilerplate(word))
            .map(|(_, &count)| count as u64)
            .sum();
        page.total_words - removed
    }

    /// Boilerplate words with their page frequency, most widespread first.
    pub fn boilerplate_words(&self) -> Vec<(&str, u32)> {
        if self.page_count < 2 {
            return Vec::new();
        }
        let mut words: Vec<(&str, u32)> = self
            .doc_freq
            .iter()
            .filter(|(word, _)| self.is_boilerplate(word))
            .map(|(word, &freq)| (word.as_str(), freq))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        words
    }
}
