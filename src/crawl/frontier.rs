//! Deduplicating FIFO frontier with page-cap accounting
//!
//! The frontier is the single owner of crawl bookkeeping: which URLs are
//! queued, which were handed to a worker, how many pages have been emitted
//! against the cap, and how many tasks are still in flight. Workers never
//! touch this state directly; they go through [`SharedFrontier`], which adds
//! blocking dequeue and end-of-work detection on top of the pure [`Frontier`].

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use url::Url;

use super::{normalize_url, CrawlScope, CrawlTask};

/// What happened to a URL submitted to the frontier.
///
/// Everything except `Queued` is a silent drop. Re-discovering known URLs is
/// the steady state of crawling, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Admitted to the queue.
    Queued,
    /// Normalized form already queued or already crawled.
    AlreadySeen,
    /// Not on the crawl's domain, or filtered by scope rules.
    OutOfScope,
    /// Deeper than the configured depth limit.
    TooDeep,
    /// Admitting it would let emitted + queued exceed the page cap.
    CapReached,
}

/// Pure frontier state. FIFO queue plus two hash sets over normalized URLs:
/// `pending` mirrors queue membership, `visited` holds everything already
/// handed to a worker. A URL is admitted only if it is in neither set, so no
/// URL is ever checked out twice.
pub struct Frontier {
    scope: CrawlScope,
    queue: VecDeque<CrawlTask>,
    pending: HashSet<u64>,
    visited: HashSet<u64>,
    /// Tasks handed out so far. Incremented at checkout, not admission, so
    /// URLs queued but never crawled do not count against the cap.
    emitted: u64,
    /// Tasks checked out and not yet reported done.
    in_flight: usize,
    /// 0 = unlimited.
    max_pages: u64,
    /// 0 = unlimited.
    max_depth: u32,
}

impl Frontier {
    pub fn new(scope: CrawlScope, max_pages: u64, max_depth: u32) -> Self {
        Self {
            scope,
            queue: VecDeque::new(),
            pending: HashSet::new(),
            visited: HashSet::new(),
            emitted: 0,
            in_flight: 0,
            max_pages,
            max_depth,
        }
    }

    /// Hash a normalized URL string to u64
    fn hash_url(normalized: &str) -> u64 {
        xxhash_rust::xxh3::xxh3_64(normalized.as_bytes())
    }

    /// Submit a URL. Admission requires, in order: in scope, never seen,
    /// within the depth limit, and room under the page cap
    /// (`emitted + queue.len() < max_pages`).
    pub fn enqueue(&mut self, url: Url, depth: u32) -> EnqueueOutcome {
        if !self.scope.admits(&url) {
            return EnqueueOutcome::OutOfScope;
        }

        let hash = Self::hash_url(&normalize_url(&url));
        if self.pending.contains(&hash) || self.visited.contains(&hash) {
            return EnqueueOutcome::AlreadySeen;
        }

        if self.max_depth > 0 && depth > self.max_depth {
            return EnqueueOutcome::TooDeep;
        }

        if self.max_pages > 0 && self.emitted + self.queue.len() as u64 >= self.max_pages {
            return EnqueueOutcome::CapReached;
        }

        self.pending.insert(hash);
        self.queue.push_back(CrawlTask::new(url, depth));
        EnqueueOutcome::Queued
    }

    /// Hand out the next task in FIFO order, recording it as visited and in
    /// flight. Entries whose normalized form was marked visited out of band
    /// (redirect targets) are dropped, not emitted.
    pub fn checkout(&mut self) -> Option<CrawlTask> {
        while let Some(task) = self.queue.pop_front() {
            let hash = Self::hash_url(&normalize_url(&task.url));
            self.pending.remove(&hash);
            if !self.visited.insert(hash) {
                continue;
            }
            self.emitted += 1;
            self.in_flight += 1;
            return Some(task);
        }
        None
    }

    /// Report a checked-out task finished (success or failure).
    pub fn task_done(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Record a URL as visited without queueing it. Used when a fetch
    /// redirects: the final URL counts as crawled too.
    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(Self::hash_url(&normalize_url(url)));
    }

    /// The crawl is over: nothing queued and nothing in flight.
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Point-in-time frontier counters, for progress logging.
#[derive(Debug, Clone, Copy)]
pub struct FrontierSnapshot {
    pub queued: usize,
    pub visited: usize,
    pub emitted: u64,
    pub in_flight: usize,
}

/// Concurrency wrapper: the one frontier shared by every worker.
///
/// `next_task` blocks until a task is available or the crawl is exhausted.
/// Wakeups ride a [`Notify`]: one wake per admitted task, and a worker that
/// takes a task while more remain queued wakes the next worker, so no task
/// can strand while a worker sleeps. A worker observing exhaustion fires one
/// more wake before returning, cascading shutdown through every parked
/// worker.
pub struct SharedFrontier {
    inner: Mutex<Frontier>,
    wake: Notify,
}

impl SharedFrontier {
    pub fn new(frontier: Frontier) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(frontier),
            wake: Notify::new(),
        })
    }

    pub async fn enqueue(&self, url: Url, depth: u32) -> EnqueueOutcome {
        let outcome = self.inner.lock().await.enqueue(url, depth);
        if outcome == EnqueueOutcome::Queued {
            self.wake.notify_one();
        }
        outcome
    }

    /// Block until a task is available or the crawl is exhausted.
    /// Returns `None` exactly when the queue is empty and no task is in
    /// flight.
    pub async fn next_task(&self) -> Option<CrawlTask> {
        loop {
            {
                let mut frontier = self.inner.lock().await;
                if let Some(task) = frontier.checkout() {
                    if frontier.queue_len() > 0 {
                        // More work remains: pass the wake along.
                        self.wake.notify_one();
                    }
                    return Some(task);
                }
                if frontier.is_exhausted() {
                    drop(frontier);
                    self.wake.notify_one();
                    return None;
                }
            }
            self.wake.notified().await;
        }
    }

    /// Report a checked-out task finished. Wakes parked workers if this was
    /// the last in-flight task so they can observe exhaustion.
    pub async fn task_done(&self) {
        let mut frontier = self.inner.lock().await;
        frontier.task_done();
        let exhausted = frontier.is_exhausted();
        drop(frontier);
        if exhausted {
            self.wake.notify_one();
        }
    }

    pub async fn mark_visited(&self, url: &Url) {
        self.inner.lock().await.mark_visited(url);
    }

    pub async fn snapshot(&self) -> FrontierSnapshot {
        let frontier = self.inner.lock().await;
        FrontierSnapshot {
            queued: frontier.queue_len(),
            visited: frontier.visited_count(),
            emitted: frontier.emitted(),
            in_flight: frontier.in_flight(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_frontier(max_pages: u64) -> Frontier {
        let seed = Url::parse("https://example.com/").unwrap();
        let scope = CrawlScope::for_seed(&seed, &[".pdf".to_string()], &[]).unwrap();
        Frontier::new(scope, max_pages, 0)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = test_frontier(0);

        frontier.enqueue(url("https://example.com/a"), 0);
        frontier.enqueue(url("https://example.com/b"), 1);
        frontier.enqueue(url("https://example.com/c"), 1);

        assert_eq!(frontier.checkout().unwrap().url.path(), "/a");
        assert_eq!(frontier.checkout().unwrap().url.path(), "/b");
        assert_eq!(frontier.checkout().unwrap().url.path(), "/c");
        assert!(frontier.checkout().is_none());
    }

    #[test]
    fn test_dedup() {
        let mut frontier = test_frontier(0);

        let first = frontier.enqueue(url("https://example.com/page"), 0);
        let second = frontier.enqueue(url("https://example.com/page"), 1);

        assert_eq!(first, EnqueueOutcome::Queued);
        assert_eq!(second, EnqueueOutcome::AlreadySeen);
        assert!(frontier.checkout().is_some());
        assert!(frontier.checkout().is_none());
    }

    #[test]
    fn test_normalized_variants_collapse() {
        let mut frontier = test_frontier(0);

        assert_eq!(
            frontier.enqueue(url("https://example.com/page"), 0),
            EnqueueOutcome::Queued
        );
        // Fragment, www, trailing slash and tracking params all collapse
        for variant in [
            "https://example.com/page#section",
            "https://www.example.com/page",
            "https://example.com/page/",
            "https://example.com/page?utm_source=x",
        ] {
            assert_eq!(
                frontier.enqueue(url(variant), 1),
                EnqueueOutcome::AlreadySeen,
                "{variant} should collapse onto the queued URL"
            );
        }
    }

    #[test]
    fn test_out_of_scope_is_dropped() {
        let mut frontier = test_frontier(0);

        assert_eq!(
            frontier.enqueue(url("https://other.com/page"), 0),
            EnqueueOutcome::OutOfScope
        );
        assert_eq!(
            frontier.enqueue(url("https://example.com/file.pdf"), 0),
            EnqueueOutcome::OutOfScope
        );
        assert_eq!(frontier.queue_len(), 0);
    }

    #[test]
    fn test_cap_admission() {
        let mut frontier = test_frontier(2);

        assert_eq!(
            frontier.enqueue(url("https://example.com/"), 0),
            EnqueueOutcome::Queued
        );
        assert_eq!(
            frontier.enqueue(url("https://example.com/a"), 1),
            EnqueueOutcome::Queued
        );
        // emitted (0) + queued (2) == cap: no more room
        assert_eq!(
            frontier.enqueue(url("https://example.com/b"), 1),
            EnqueueOutcome::CapReached
        );

        // Checking out does not open room: emitted takes over from queued
        let _ = frontier.checkout().unwrap();
        assert_eq!(
            frontier.enqueue(url("https://example.com/c"), 1),
            EnqueueOutcome::CapReached
        );
        assert_eq!(frontier.emitted(), 1);
    }

    #[test]
    fn test_visited_marked_at_checkout() {
        let mut frontier = test_frontier(0);

        frontier.enqueue(url("https://example.com/a"), 0);
        assert_eq!(frontier.visited_count(), 0);

        let task = frontier.checkout().unwrap();
        assert_eq!(task.depth, 0);
        assert_eq!(frontier.visited_count(), 1);
        assert_eq!(frontier.emitted(), 1);

        // Re-discovery after crawling is still a silent drop
        assert_eq!(
            frontier.enqueue(url("https://example.com/a"), 3),
            EnqueueOutcome::AlreadySeen
        );
    }

    #[test]
    fn test_checkout_skips_urls_marked_visited() {
        let mut frontier = test_frontier(0);

        frontier.enqueue(url("https://example.com/a"), 0);
        frontier.enqueue(url("https://example.com/b"), 1);

        // A redirect landed on /b before its queued task ran
        frontier.mark_visited(&url("https://example.com/b"));

        assert_eq!(frontier.checkout().unwrap().url.path(), "/a");
        assert!(frontier.checkout().is_none());
        assert_eq!(frontier.emitted(), 1);
    }

    #[test]
    fn test_max_depth_limit() {
        let seed = Url::parse("https://example.com/").unwrap();
        let scope = CrawlScope::for_seed(&seed, &[], &[]).unwrap();
        let mut frontier = Frontier::new(scope, 0, 2);

        assert_eq!(
            frontier.enqueue(url("https://example.com/a"), 2),
            EnqueueOutcome::Queued
        );
        assert_eq!(
            frontier.enqueue(url("https://example.com/b"), 3),
            EnqueueOutcome::TooDeep
        );
    }

    #[test]
    fn test_exhaustion() {
        let mut frontier = test_frontier(0);
        assert!(frontier.is_exhausted());

        frontier.enqueue(url("https://example.com/a"), 0);
        assert!(!frontier.is_exhausted());

        let _ = frontier.checkout().unwrap();
        // Queue empty but a worker still holds the task
        assert!(!frontier.is_exhausted());

        frontier.task_done();
        assert!(frontier.is_exhausted());
    }

    // ========================================================================
    // SharedFrontier: blocking dequeue and completion detection
    // ========================================================================

    fn shared_frontier(max_pages: u64) -> Arc<SharedFrontier> {
        SharedFrontier::new(test_frontier(max_pages))
    }

    #[tokio::test]
    async fn test_next_task_returns_none_when_exhausted() {
        let shared = shared_frontier(0);
        assert!(shared.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_reflects_live_state() {
        let shared = shared_frontier(0);
        shared.enqueue(url("https://example.com/"), 0).await;
        shared.enqueue(url("https://example.com/a"), 1).await;
        let _task = shared.next_task().await.unwrap();

        let snap = shared.snapshot().await;
        assert_eq!(snap.queued, 1);
        assert_eq!(snap.visited, 1);
        assert_eq!(snap.emitted, 1);
        assert_eq!(snap.in_flight, 1);
        shared.task_done().await;
    }

    #[tokio::test]
    async fn test_parked_worker_wakes_on_enqueue() {
        let shared = shared_frontier(0);
        shared.enqueue(url("https://example.com/"), 0).await;

        // Hold the seed in flight so the waiter parks instead of exiting
        let seed = shared.next_task().await.unwrap();
        assert_eq!(seed.depth, 0);

        let waiter = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.next_task().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        shared.enqueue(url("https://example.com/next"), 1).await;
        let task = waiter.await.unwrap();
        assert_eq!(task.unwrap().url.path(), "/next");

        shared.task_done().await;
        shared.task_done().await;
    }

    #[tokio::test]
    async fn test_all_parked_workers_released_at_exhaustion() {
        let shared = shared_frontier(0);
        shared.enqueue(url("https://example.com/"), 0).await;
        let _seed = shared.next_task().await.unwrap();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let shared = Arc::clone(&shared);
            waiters.push(tokio::spawn(async move { shared.next_task().await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Last in-flight task finishes with nothing queued: crawl is over
        shared.task_done().await;

        for waiter in waiters {
            assert!(waiter.await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_all_get_served() {
        let shared = shared_frontier(0);
        shared.enqueue(url("https://example.com/"), 0).await;
        let _seed = shared.next_task().await.unwrap();

        let mut waiters = Vec::new();
        for _ in 0..2 {
            let shared = Arc::clone(&shared);
            waiters.push(tokio::spawn(async move { shared.next_task().await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Two tasks arrive back to back; both parked workers must be served
        shared.enqueue(url("https://example.com/a"), 1).await;
        shared.enqueue(url("https://example.com/b"), 1).await;

        let mut got = Vec::new();
        for waiter in waiters {
            got.push(waiter.await.unwrap().unwrap().url.path().to_string());
        }
        got.sort();
        assert_eq!(got, vec!["/a".to_string(), "/b".to_string()]);
    }
}
