//! Crawl coordinator driving the fetch -> extract -> analyze pipeline
//!
//! The coordinator owns all shared crawl state and hands workers cloned
//! handles; nothing global. It crawls the seed inline first (a dead seed is
//! a configuration problem, not a page failure), then runs a fixed pool of
//! workers until the frontier reports exhaustion. Per-page failures are
//! tallied and skipped; they never abort the run.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

use super::frontier::{EnqueueOutcome, Frontier, FrontierSnapshot, SharedFrontier};
use super::{normalize_url, CrawlError, CrawlScope, CrawlTask};
use crate::analysis::{PageAnalyzer, PageResult};
use crate::config::CrawlConfig;
use crate::extract::extract_page;
use crate::render::{PageRenderer, RenderedPage};
use crate::util::truncate_str;

/// Counters accumulated while the crawl runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStats {
    /// Tasks handed to a worker (or the seed pre-flight).
    pub pages_attempted: u64,
    /// Pages that rendered and produced a result.
    pub pages_succeeded: u64,
    /// Pages that failed to render. The crawl continued past them.
    pub pages_failed: u64,
    /// Successful pages with no words at all.
    pub zero_word_pages: u64,
    /// Links seen on crawled pages, before any filtering.
    pub urls_discovered: u64,
    /// Links the frontier actually admitted.
    pub urls_admitted: u64,
    /// Running average fetch time across successful pages.
    pub avg_fetch_ms: f64,
}

/// What a finished crawl hands back.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub results: Vec<PageResult>,
    pub stats: CrawlStats,
}

/// Everything a worker needs, cloned per worker.
#[derive(Clone)]
struct WorkerCtx {
    frontier: Arc<SharedFrontier>,
    renderer: Arc<dyn PageRenderer>,
    analyzer: Arc<PageAnalyzer>,
    results: Arc<Mutex<Vec<PageResult>>>,
    stats: Arc<RwLock<CrawlStats>>,
    delay: Duration,
}

/// Coordinates one crawl from seed to exhaustion.
pub struct CrawlCoordinator {
    seed: Url,
    worker_count: usize,
    delay: Duration,
    frontier: Arc<SharedFrontier>,
    renderer: Arc<dyn PageRenderer>,
    analyzer: Arc<PageAnalyzer>,
    results: Arc<Mutex<Vec<PageResult>>>,
    stats: Arc<RwLock<CrawlStats>>,
}

impl CrawlCoordinator {
    pub fn new(
        seed: Url,
        config: &CrawlConfig,
        renderer: Arc<dyn PageRenderer>,
        analyzer: PageAnalyzer,
    ) -> Result<Self, CrawlError> {
        if config.worker_count == 0 {
            return Err(CrawlError::NoWorkers);
        }
        let scope = CrawlScope::for_seed(&seed, &config.skip_extensions, &config.exclude_patterns)?;
        let frontier = SharedFrontier::new(Frontier::new(
            scope,
            config.max_pages,
            config.max_depth,
        ));

        Ok(Self {
            seed,
            worker_count: config.worker_count,
            delay: Duration::from_millis(config.delay_ms),
            frontier,
            renderer,
            analyzer: Arc::new(analyzer),
            results: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(RwLock::new(CrawlStats::default())),
        })
    }

    /// Crawl until the frontier is exhausted. Fatal only if the seed itself
    /// cannot be crawled; page failures along the way are tallied in stats.
    pub async fn run(&self) -> Result<CrawlOutcome, CrawlError> {
        match self.frontier.enqueue(self.seed.clone(), 0).await {
            EnqueueOutcome::Queued => {}
            _ => {
                return Err(CrawlError::InvalidSeed {
                    url: self.seed.to_string(),
                    reason: "seed is excluded by the crawl's own scope rules".to_string(),
                })
            }
        }

        let ctx = self.worker_ctx();

        // Seed pre-flight, before any worker exists
        let seed_task = match self.frontier.next_task().await {
            Some(task) => task,
            None => return Ok(self.take_outcome().await),
        };
        match self.renderer.render(&seed_task.url).await {
            Ok(page) => {
                handle_page(&ctx, &seed_task, page).await;
                self.frontier.task_done().await;
            }
            Err(source) => {
                self.frontier.task_done().await;
                return Err(CrawlError::SeedUnreachable {
                    url: seed_task.url,
                    source,
                });
            }
        }

        tracing::info!("Seed crawled, starting {} workers", self.worker_count);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.worker_count {
            let ctx = ctx.clone();
            workers.spawn(worker_loop(ctx, worker_id));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    // The worker died mid-task; release its in-flight slot
                    // so the rest of the pool can still reach exhaustion.
                    tracing::error!("Worker panicked: {}", e);
                    self.frontier.task_done().await;
                }
            }
        }

        let outcome = self.take_outcome().await;
        tracing::info!(
            "Crawl complete: {} pages succeeded, {} failed",
            outcome.stats.pages_succeeded,
            outcome.stats.pages_failed
        );
        Ok(outcome)
    }

    /// Current counters. The crawl keeps running.
    pub async fn stats(&self) -> CrawlStats {
        self.stats.read().await.clone()
    }

    /// Live frontier counters, for progress reporting.
    pub async fn frontier_snapshot(&self) -> FrontierSnapshot {
        self.frontier.snapshot().await
    }

    fn worker_ctx(&self) -> WorkerCtx {
        WorkerCtx {
            frontier: Arc::clone(&self.frontier),
            renderer: Arc::clone(&self.renderer),
            analyzer: Arc::clone(&self.analyzer),
            results: Arc::clone(&self.results),
            stats: Arc::clone(&self.stats),
            delay: self.delay,
        }
    }

    async fn take_outcome(&self) -> CrawlOutcome {
        let results = std::mem::take(&mut *self.results.lock().await);
        let stats = self.stats.read().await.clone();
        CrawlOutcome { results, stats }
    }
}

/// One worker: dequeue, process, report done, pause, repeat until the
/// frontier signals end-of-work.
async fn worker_loop(ctx: WorkerCtx, worker_id: usize) {
    tracing::debug!("Worker {} started", worker_id);
    while let Some(task) = ctx.frontier.next_task().await {
        process_task(&ctx, &task).await;
        ctx.frontier.task_done().await;
        if !ctx.delay.is_zero() {
            tokio::time::sleep(ctx.delay).await;
        }
    }
    tracing::debug!("Worker {} finished", worker_id);
}

async fn process_task(ctx: &WorkerCtx, task: &CrawlTask) {
    match ctx.renderer.render(&task.url).await {
        Ok(page) => handle_page(ctx, task, page).await,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", task.url, e);
            let mut stats = ctx.stats.write().await;
            stats.pages_attempted += 1;
            stats.pages_failed += 1;
        }
    }
}

/// Shared tail of the pipeline: extract, analyze, feed links back, publish.
async fn handle_page(ctx: &WorkerCtx, task: &CrawlTask, rendered: RenderedPage) {
    let fetch_ms = rendered.fetch_duration.as_secs_f64() * 1000.0;

    // A redirect means the final URL was crawled too; record it so its own
    // queued task (if any) is dropped instead of fetched again.
    if normalize_url(&rendered.final_url) != normalize_url(&task.url) {
        ctx.frontier.mark_visited(&rendered.final_url).await;
    }

    // HTML parsing and tokenization are CPU-bound; keep them off the
    // async runtime threads.
    let analyzer = Arc::clone(&ctx.analyzer);
    let page_url = task.url.clone();
    let final_url = rendered.final_url.clone();
    let html = rendered.html;
    let analyzed = tokio::task::spawn_blocking(move || {
        let extracted = extract_page(&html, &final_url);
        analyzer.analyze(&page_url, &extracted.text, extracted.links)
    })
    .await;

    let result = match analyzed {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Analysis task failed for {}: {}", task.url, e);
            let mut stats = ctx.stats.write().await;
            stats.pages_attempted += 1;
            stats.pages_failed += 1;
            return;
        }
    };

    let mut admitted = 0u64;
    for link in &result.discovered_links {
        if ctx.frontier.enqueue(link.clone(), task.depth + 1).await == EnqueueOutcome::Queued {
            admitted += 1;
        }
    }

    tracing::debug!(
        "Crawled {} - {} words, {}/{} links admitted",
        truncate_str(task.url.as_str(), 60),
        result.total_words,
        admitted,
        result.discovered_links.len()
    );

    {
        let mut stats = ctx.stats.write().await;
        stats.pages_attempted += 1;
        stats.pages_succeeded += 1;
        if result.total_words == 0 {
            stats.zero_word_pages += 1;
        }
        stats.urls_discovered += result.discovered_links.len() as u64;
        stats.urls_admitted += admitted;
        let n = stats.pages_succeeded as f64;
        // Running average
        stats.avg_fetch_ms = (stats.avg_fetch_ms * (n - 1.0) + fetch_ms) / n;
    }

    ctx.results.lock().await.push(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UrlLanguageDetector;
    use crate::render::RenderError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;

    /// In-memory site: url -> html, plus scripted failures, panics and
    /// redirects.
    struct ScriptedRenderer {
        pages: HashMap<String, String>,
        failures: HashSet<String>,
        panics: HashSet<String>,
        redirects: HashMap<String, String>,
        hits: StdMutex<Vec<String>>,
    }

    impl ScriptedRenderer {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                failures: HashSet::new(),
                panics: HashSet::new(),
                redirects: HashMap::new(),
                hits: StdMutex::new(Vec::new()),
            }
        }

        fn failing(mut self, url: &str) -> Self {
            self.failures.insert(url.to_string());
            self
        }

        fn panicking(mut self, url: &str) -> Self {
            self.panics.insert(url.to_string());
            self
        }

        fn redirecting(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }

        fn hits(&self) -> Vec<String> {
            self.hits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageRenderer for ScriptedRenderer {
        async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError> {
            self.hits.lock().unwrap().push(url.to_string());
            if self.failures.contains(url.as_str()) {
                return Err(RenderError::BadStatus(500));
            }
            if self.panics.contains(url.as_str()) {
                panic!("scripted panic while rendering {url}");
            }
            let final_url = match self.redirects.get(url.as_str()) {
                Some(target) => Url::parse(target).unwrap(),
                None => url.clone(),
            };
            match self.pages.get(final_url.as_str()) {
                Some(html) => Ok(RenderedPage {
                    html: html.clone(),
                    final_url,
                    fetch_duration: Duration::from_millis(2),
                }),
                None => Err(RenderError::BadStatus(404)),
            }
        }
    }

    // Anchor text stays empty so links never add words of their own.
    fn html(text: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"{l}\"></a>"))
            .collect();
        format!("<html><body><p>{text}</p>{anchors}</body></html>")
    }

    fn coordinator_with(renderer: Arc<ScriptedRenderer>, config: CrawlConfig) -> CrawlCoordinator {
        let analyzer = PageAnalyzer::new(
            false,
            Box::new(UrlLanguageDetector::for_host("example.com")),
        );
        let seed = Url::parse("https://example.com/").unwrap();
        CrawlCoordinator::new(seed, &config, renderer, analyzer).unwrap()
    }

    fn coordinator(renderer: Arc<ScriptedRenderer>, max_pages: u64) -> CrawlCoordinator {
        let config = CrawlConfig {
            worker_count: 3,
            delay_ms: 0,
            max_pages,
            ..CrawlConfig::default()
        };
        coordinator_with(renderer, config)
    }

    #[tokio::test]
    async fn test_crawls_every_reachable_page_once() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("home words", &["/a", "/b"])),
            ("https://example.com/a", &html("page a", &["/b", "/"])),
            ("https://example.com/b", &html("page b", &["/a"])),
        ]));
        let outcome = coordinator(Arc::clone(&renderer), 0).run().await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.stats.pages_attempted, 3);
        assert_eq!(outcome.stats.pages_succeeded, 3);
        // Every page fetched exactly once despite the link cycle
        assert_eq!(renderer.hits().len(), 3);
    }

    #[tokio::test]
    async fn test_page_cap_limits_emission() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("home", &["/1", "/2", "/3", "/4", "/5"])),
            ("https://example.com/1", &html("one", &[])),
            ("https://example.com/2", &html("two", &[])),
            ("https://example.com/3", &html("three", &[])),
            ("https://example.com/4", &html("four", &[])),
            ("https://example.com/5", &html("five", &[])),
        ]));
        let outcome = coordinator(Arc::clone(&renderer), 3).run().await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.stats.pages_attempted, 3);
        assert_eq!(renderer.hits().len(), 3);
    }

    #[tokio::test]
    async fn test_cap_larger_than_site_crawls_everything() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("home", &["/a"])),
            ("https://example.com/a", &html("a", &[])),
        ]));
        let outcome = coordinator(renderer, 100).run().await.unwrap();
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_does_not_abort_the_crawl() {
        let renderer = Arc::new(
            ScriptedRenderer::new(&[
                ("https://example.com/", &html("home", &["/broken", "/fine"])),
                ("https://example.com/fine", &html("fine page", &[])),
            ])
            .failing("https://example.com/broken"),
        );
        let outcome = coordinator(Arc::clone(&renderer), 0).run().await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.stats.pages_attempted, 3);
        assert_eq!(outcome.stats.pages_failed, 1);
        assert_eq!(outcome.stats.pages_succeeded, 2);
    }

    #[tokio::test]
    async fn test_worker_panic_does_not_stall_the_crawl() {
        let renderer = Arc::new(
            ScriptedRenderer::new(&[
                ("https://example.com/", &html("home", &["/boom", "/a", "/b"])),
                ("https://example.com/a", &html("page a", &[])),
                ("https://example.com/b", &html("page b", &[])),
            ])
            .panicking("https://example.com/boom"),
        );
        // Two workers: one dies on /boom, the other must still drain the queue
        let config = CrawlConfig {
            worker_count: 2,
            delay_ms: 0,
            ..CrawlConfig::default()
        };
        let outcome = coordinator_with(Arc::clone(&renderer), config)
            .run()
            .await
            .unwrap();

        // The panicked page is lost; the rest of the site is not
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results.iter().all(|r| r.url.path() != "/boom"));
        assert_eq!(outcome.stats.pages_succeeded, 3);
        assert_eq!(renderer.hits().len(), 4);
    }

    #[tokio::test]
    async fn test_seed_failure_is_fatal() {
        let renderer =
            Arc::new(ScriptedRenderer::new(&[]).failing("https://example.com/"));
        let result = coordinator(renderer, 0).run().await;

        assert!(matches!(result, Err(CrawlError::SeedUnreachable { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let renderer = Arc::new(ScriptedRenderer::new(&[]));
        let analyzer = PageAnalyzer::new(
            false,
            Box::new(UrlLanguageDetector::for_host("example.com")),
        );
        let seed = Url::parse("https://example.com/").unwrap();
        let config = CrawlConfig {
            worker_count: 0,
            ..CrawlConfig::default()
        };

        let result = CrawlCoordinator::new(seed, &config, renderer, analyzer);
        assert!(matches!(result, Err(CrawlError::NoWorkers)));
    }

    #[tokio::test]
    async fn test_crawl_stays_on_domain() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            (
                "https://example.com/",
                &html("home", &["/local", "https://other.com/away"]),
            ),
            ("https://example.com/local", &html("local", &[])),
        ]));
        let outcome = coordinator(Arc::clone(&renderer), 0).run().await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.stats.urls_discovered, 2);
        assert_eq!(outcome.stats.urls_admitted, 1);
        assert!(renderer.hits().iter().all(|u| u.contains("example.com")));
    }

    #[tokio::test]
    async fn test_zero_word_page_still_counts() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("home", &["/empty"])),
            ("https://example.com/empty", "<html><body></body></html>"),
        ]));
        let outcome = coordinator(renderer, 0).run().await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.stats.zero_word_pages, 1);
        let empty = outcome
            .results
            .iter()
            .find(|r| r.url.path() == "/empty")
            .unwrap();
        assert_eq!(empty.total_words, 0);
    }

    #[tokio::test]
    async fn test_redirect_target_not_fetched_twice() {
        let renderer = Arc::new(
            ScriptedRenderer::new(&[
                ("https://example.com/", &html("home", &["/old", "/new"])),
                ("https://example.com/new", &html("landing", &[])),
            ])
            .redirecting("https://example.com/old", "https://example.com/new"),
        );
        // One worker keeps the order deterministic: /old runs before /new
        let config = CrawlConfig {
            worker_count: 1,
            delay_ms: 0,
            ..CrawlConfig::default()
        };
        let outcome = coordinator_with(Arc::clone(&renderer), config)
            .run()
            .await
            .unwrap();

        // /old redirected onto /new, so the queued /new task was dropped
        assert_eq!(outcome.results.len(), 2);
        let hits = renderer.hits();
        assert_eq!(hits.len(), 2, "expected no direct fetch of /new: {hits:?}");
    }

    #[tokio::test]
    async fn test_single_worker_completes() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("home", &["/a", "/b"])),
            ("https://example.com/a", &html("a", &["/b"])),
            ("https://example.com/b", &html("b", &[])),
        ]));
        let config = CrawlConfig {
            worker_count: 1,
            delay_ms: 0,
            ..CrawlConfig::default()
        };
        let outcome = coordinator_with(renderer, config).run().await.unwrap();
        assert_eq!(outcome.results.len(), 3);
    }

    #[tokio::test]
    async fn test_results_carry_analysis_fields() {
        let renderer = Arc::new(ScriptedRenderer::new(&[
            ("https://example.com/", &html("welcome home", &["/blog/post"])),
            ("https://example.com/blog/post", &html("a post", &[])),
        ]));
        let outcome = coordinator(renderer, 0).run().await.unwrap();

        let post = outcome
            .results
            .iter()
            .find(|r| r.category == "blog")
            .unwrap();
        assert_eq!(post.language, "en");
        assert_eq!(post.total_words, 2);

        let root = outcome
            .results
            .iter()
            .find(|r| r.category == "root")
            .unwrap();
        assert_eq!(root.total_words, 2);
    }

    #[tokio::test]
    async fn test_avg_fetch_time_tracked() {
        let renderer = Arc::new(ScriptedRenderer::new(&[(
            "https://example.com/",
            &html("home", &[]),
        )]));
        let outcome = coordinator(renderer, 0).run().await.unwrap();
        assert!(outcome.stats.avg_fetch_ms > 0.0);
    }
}
