//! Category-differential boilerplate
//!
//! The document-frequency rule from [`super::boilerplate`], run once per
//! site section instead of site-wide. A sidebar repeated on every product
//! page may be rare site-wide and invisible to the global profile; inside
//! the products section it is on 100% of pages. The reverse also holds,
//! which is why a page's category-unique count is bounded by its total but
//! not by its global unique count.

use std::collections::HashMap;

use super::{BoilerplateProfile, PageResult};

/// One boilerplate profile per category.
#[derive(Debug)]
pub struct CategoryProfiles {
    profiles: HashMap<String, BoilerplateProfile>,
}

impl CategoryProfiles {
    /// Partition `pages` by category and profile each group independently.
    pub fn build(pages: &[PageResult], threshold: f64) -> Self {
        let mut groups: HashMap<&str, Vec<&PageResult>> = HashMap::new();
        for page in pages {
            groups.entry(page.category.as_str()).or_default().push(page);
        }

        let profiles = groups
            .into_iter()
            .map(|(category, group)| {
                (
                    category.to_string(),
                    BoilerplateProfile::build(group, threshold),
                )
            })
            .collect();

        Self { profiles }
    }

    /// Unique count of `page` measured against its own category's profile.
    /// A page from a category these profiles never saw keeps all its words.
    pub fn category_unique_count(&self, page: &PageResult) -> u64 {
        match self.profiles.get(&page.category) {
            Some(profile) => profile.unique_word_count(page),
            None => page.total_words,
        }
    }

    pub fn profile(&self, category: &str) -> Option<&BoilerplateProfile> {
        self.profiles.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|s| s.as_str())
    }
}
