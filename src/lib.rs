//! Boilerscan: single-domain crawler with boilerplate-aware word statistics
//!
//! Crawls every reachable page of one domain with a fixed pool of async
//! workers, counts words per page, and separates genuine content from
//! boilerplate: words that recur across (nearly) all pages, such as
//! navigation, footers, and cookie banners. Reports per-page unique-word
//! counts, an optional per-category differential, and site-wide boilerplate
//! share.

pub mod analysis;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod render;
pub mod report;
pub mod util;

pub use config::Config;
pub use crawl::{CrawlCoordinator, CrawlOutcome, CrawlStats};
pub use report::CrawlReport;
