//! Report building and rendering
//!
//! A [`CrawlReport`] is computed once, after the crawl, from the full set of
//! page results plus the crawl statistics. It carries every number the text
//! and JSON outputs need; rendering never recomputes anything.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::analysis::{BoilerplateProfile, CategoryProfiles, PageResult};
use crate::crawl::CrawlStats;
use crate::util::group_digits;

/// One line per crawled page.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub url: String,
    pub category: String,
    pub language: String,
    pub total_words: u64,
    /// Words left after removing the site-wide boilerplate.
    pub unique_words: u64,
    /// Words left after removing the page's own category's boilerplate.
    /// Absent when the category differential is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_unique_words: Option<u64>,
}

/// Site-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub pages: usize,
    pub total_words: u64,
    pub unique_words: u64,
    /// `1 - unique/total`; 0 when nothing was crawled.
    pub boilerplate_share: f64,
}

/// Totals for one site section, measured against that section's own profile.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub pages: usize,
    pub total_words: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_words: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boilerplate_share: Option<f64>,
}

/// Totals for one language bucket.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub language: String,
    pub pages: usize,
    pub total_words: u64,
    /// Most common categories inside this language, by page count.
    pub top_categories: Vec<String>,
}

/// A site-wide boilerplate word and how many pages carry it.
#[derive(Debug, Clone, Serialize)]
pub struct BoilerplateWord {
    pub word: String,
    pub pages: u32,
}

/// Everything the crawl learned, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub seed: String,
    pub threshold: f64,
    pub site: SiteSummary,
    pub top_boilerplate: Vec<BoilerplateWord>,
    pub categories: Vec<CategorySummary>,
    pub languages: Vec<LanguageSummary>,
    /// All pages, heaviest first.
    pub entries: Vec<ReportEntry>,
    pub stats: CrawlStats,
}

/// How many boilerplate words the text report lists.
const TOP_BOILERPLATE_WORDS: usize = 15;

/// How many categories each language row lists.
const TOP_CATEGORIES_PER_LANGUAGE: usize = 3;

impl CrawlReport {
    pub fn build(
        seed: &Url,
        results: &[PageResult],
        stats: CrawlStats,
        threshold: f64,
        category_diff: bool,
    ) -> Self {
        let global = BoilerplateProfile::build(results, threshold);
        let per_category = category_diff.then(|| CategoryProfiles::build(results, threshold));

        let mut entries: Vec<ReportEntry> = results
            .iter()
            .map(|page| ReportEntry {
                url: page.url.to_string(),
                category: page.category.clone(),
                language: page.language.clone(),
                total_words: page.total_words,
                unique_words: global.unique_word_count(page),
                category_unique_words: per_category
                    .as_ref()
                    .map(|profiles| profiles.category_unique_count(page)),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_words
                .cmp(&a.total_words)
                .then_with(|| a.url.cmp(&b.url))
        });

        let total_words: u64 = entries.iter().map(|e| e.total_words).sum();
        let unique_words: u64 = entries.iter().map(|e| e.unique_words).sum();
        let site = SiteSummary {
            pages: entries.len(),
            total_words,
            unique_words,
            boilerplate_share: share_of(total_words, unique_words),
        };

        let top_boilerplate = global
            .boilerplate_words()
            .into_iter()
            .take(TOP_BOILERPLATE_WORDS)
            .map(|(word, pages)| BoilerplateWord {
                word: word.to_string(),
                pages,
            })
            .collect();

        let categories = summarize_categories(&entries);
        let languages = summarize_languages(&entries);

        Self {
            generated_at: Utc::now(),
            run_id: Uuid::new_v4(),
            seed: seed.to_string(),
            threshold: global.threshold(),
            site,
            top_boilerplate,
            categories,
            languages,
            entries,
            stats,
        }
    }
}

/// Boilerplate share given totals: `1 - unique/total`, 0 for an empty crawl.
fn share_of(total: u64, unique: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        1.0 - unique as f64 / total as f64
    }
}

fn summarize_categories(entries: &[ReportEntry]) -> Vec<CategorySummary> {
    let mut groups: HashMap<&str, Vec<&ReportEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.category.as_str()).or_default().push(entry);
    }

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, group)| {
            let pages = group.len();
            let total_words: u64 = group.iter().map(|e| e.total_words).sum();
            // Category-unique sums only exist when the differential ran
            let unique_words: Option<u64> = group
                .iter()
                .map(|e| e.category_unique_words)
                .sum::<Option<u64>>();
            CategorySummary {
                category: category.to_string(),
                pages,
                total_words,
                boilerplate_share: unique_words.map(|u| share_of(total_words, u)),
                unique_words,
            }
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.total_words
            .cmp(&a.total_words)
            .then_with(|| a.category.cmp(&b.category))
    });
    summaries
}

fn summarize_languages(entries: &[ReportEntry]) -> Vec<LanguageSummary> {
    let mut groups: HashMap<&str, (usize, u64, HashMap<&str, usize>)> = HashMap::new();
    for entry in entries {
        let slot = groups.entry(entry.language.as_str()).or_default();
        slot.0 += 1;
        slot.1 += entry.total_words;
        *slot.2.entry(entry.category.as_str()).or_insert(0) += 1;
    }

    let mut summaries: Vec<LanguageSummary> = groups
        .into_iter()
        .map(|(language, (pages, total_words, categories))| {
            let mut ranked: Vec<(&str, usize)> = categories.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            LanguageSummary {
                language: language.to_string(),
                pages,
                total_words,
                top_categories: ranked
                    .into_iter()
                    .take(TOP_CATEGORIES_PER_LANGUAGE)
                    .map(|(category, _)| category.to_string())
                    .collect(),
            }
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.total_words
            .cmp(&a.total_words)
            .then_with(|| a.language.cmp(&b.language))
    });
    summaries
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = "=".repeat(64);
        writeln!(f, "{divider}")?;
        writeln!(f, "BOILERPLATE ANALYSIS REPORT")?;
        writeln!(f, "{divider}")?;
        writeln!(f, "Seed:       {}", self.seed)?;
        writeln!(f, "Generated:  {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Run:        {}", self.run_id)?;
        writeln!(f, "Threshold:  {:.2}", self.threshold)?;

        writeln!(f)?;
        writeln!(f, "CRAWL STATISTICS")?;
        writeln!(f, "{}", "-".repeat(32))?;
        writeln!(f, "Pages attempted:   {}", self.stats.pages_attempted)?;
        writeln!(f, "Pages succeeded:   {}", self.stats.pages_succeeded)?;
        writeln!(f, "Pages failed:      {}", self.stats.pages_failed)?;
        writeln!(f, "Zero-word pages:   {}", self.stats.zero_word_pages)?;
        writeln!(f, "URLs discovered:   {}", self.stats.urls_discovered)?;
        writeln!(f, "URLs admitted:     {}", self.stats.urls_admitted)?;
        writeln!(f, "Avg fetch time:    {:.1} ms", self.stats.avg_fetch_ms)?;

        writeln!(f)?;
        writeln!(f, "SITE SUMMARY")?;
        writeln!(f, "{}", "-".repeat(32))?;
        writeln!(f, "Pages analyzed:     {}", self.site.pages)?;
        writeln!(f, "Total words:        {}", group_digits(self.site.total_words))?;
        writeln!(f, "Unique words:       {}", group_digits(self.site.unique_words))?;
        writeln!(
            f,
            "Boilerplate share:  {:.1}%",
            self.site.boilerplate_share * 100.0
        )?;

        if !self.top_boilerplate.is_empty() {
            writeln!(f)?;
            writeln!(f, "TOP BOILERPLATE WORDS")?;
            writeln!(f, "{}", "-".repeat(32))?;
            for word in &self.top_boilerplate {
                writeln!(f, "{:<24} {:>4} pages", word.word, word.pages)?;
            }
        }

        if !self.categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "BREAKDOWN BY CATEGORY")?;
            writeln!(f, "{}", "-".repeat(72))?;
            let with_diff = self.categories.iter().any(|c| c.unique_words.is_some());
            if with_diff {
                writeln!(
                    f,
                    "{:<20} {:>8} {:>14} {:>14} {:>10}",
                    "Category", "Pages", "Total Words", "Unique Words", "Boiler%"
                )?;
                for cat in &self.categories {
                    writeln!(
                        f,
                        "{:<20} {:>8} {:>14} {:>14} {:>9.1}%",
                        cat.category,
                        cat.pages,
                        group_digits(cat.total_words),
                        group_digits(cat.unique_words.unwrap_or(0)),
                        cat.boilerplate_share.unwrap_or(0.0) * 100.0
                    )?;
                }
            } else {
                writeln!(
                    f,
                    "{:<20} {:>8} {:>14} {:>16}",
                    "Category", "Pages", "Total Words", "Avg Words/Page"
                )?;
                for cat in &self.categories {
                    let avg = cat.total_words as f64 / cat.pages.max(1) as f64;
                    writeln!(
                        f,
                        "{:<20} {:>8} {:>14} {:>16.0}",
                        cat.category,
                        cat.pages,
                        group_digits(cat.total_words),
                        avg
                    )?;
                }
            }
        }

        if !self.languages.is_empty() {
            writeln!(f)?;
            writeln!(f, "BREAKDOWN BY LANGUAGE")?;
            writeln!(f, "{}", "-".repeat(60))?;
            writeln!(
                f,
                "{:<12} {:>8} {:>14} {:>16}  {}",
                "Language", "Pages", "Total Words", "Avg Words/Page", "Top Categories"
            )?;
            for lang in &self.languages {
                let avg = lang.total_words as f64 / lang.pages.max(1) as f64;
                writeln!(
                    f,
                    "{:<12} {:>8} {:>14} {:>16.0}  {}",
                    lang.language,
                    lang.pages,
                    group_digits(lang.total_words),
                    avg,
                    lang.top_categories.join(", ")
                )?;
            }
        }

        if !self.entries.is_empty() {
            writeln!(f)?;
            writeln!(f, "PAGES BY WORD COUNT")?;
            writeln!(f, "{}", "-".repeat(72))?;
            for entry in &self.entries {
                let counts = match entry.category_unique_words {
                    Some(cu) => format!(
                        "{}/{}/{}",
                        group_digits(entry.total_words),
                        group_digits(entry.unique_words),
                        group_digits(cu)
                    ),
                    None => format!(
                        "{}/{}",
                        group_digits(entry.total_words),
                        group_digits(entry.unique_words)
                    ),
                };
                writeln!(
                    f,
                    "{} words [{}] [{}] - {}",
                    counts, entry.language, entry.category, entry.url
                )?;
            }
        }

        Ok(())
    }
}
