use crate::classify::{Classification, LinkClassifier};
use crate::error::{FetchError, FrontierError, Result, ScanError};
use crate::fetcher::Fetcher;
use crate::frontier::{EntryState, Frontier, FrontierEntry};
use crate::result::{CrawlSummary, PageOutcome};
use crate::store::{LinkRecord, LinkStore};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageOutcome) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Running,
    Draining,
    Idle,
}

/// Cooperative stop signal, checked by workers between dequeues.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a worker needs, cheap to clone into each task.
#[derive(Clone)]
struct WorkerContext {
    fetcher: Arc<dyn Fetcher>,
    frontier: Arc<dyn Frontier>,
    store: Arc<dyn LinkStore>,
    classifier: Arc<LinkClassifier>,
    max_retries: u32,
    fetch_timeout: Duration,
    idle_poll: Duration,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    stop: StopHandle,
    phase: Arc<Mutex<CrawlPhase>>,
    summary: Arc<Mutex<CrawlSummary>>,
}

pub struct Crawler {
    ctx: WorkerContext,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        frontier: Arc<dyn Frontier>,
        store: Arc<dyn LinkStore>,
        classifier: Arc<LinkClassifier>,
    ) -> Self {
        Self {
            ctx: WorkerContext {
                fetcher,
                frontier,
                store,
                classifier,
                max_retries: DEFAULT_MAX_RETRIES,
                fetch_timeout: DEFAULT_FETCH_TIMEOUT,
                idle_poll: Duration::from_millis(10),
                progress_callback: None,
                result_callback: None,
                stop: StopHandle::default(),
                phase: Arc::new(Mutex::new(CrawlPhase::Idle)),
                summary: Arc::new(Mutex::new(CrawlSummary::default())),
            },
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.ctx.max_retries = max_retries.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.ctx.fetch_timeout = timeout;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.ctx.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.ctx.result_callback = Some(callback);
        self
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.ctx.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.ctx.stop.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        *self.ctx.phase.lock()
    }

    /// Enqueue the seeds if the frontier has no outstanding work.
    /// Returns `false` when resuming an existing frontier.
    pub fn seed(&self, seeds: &[String]) -> Result<bool> {
        self.ctx.set_phase(CrawlPhase::Seeding);

        if !self.ctx.frontier.is_empty()? {
            info!("Frontier has outstanding work, resuming");
            return Ok(false);
        }

        for seed in seeds {
            Url::parse(seed).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;
            if self.ctx.frontier.enqueue_if_absent(seed)? {
                info!("Seeded frontier with {}", seed);
            } else {
                debug!("Seed {} already known to the frontier", seed);
            }
        }
        Ok(true)
    }

    /// Process a single frontier entry, if one is pending.
    pub async fn crawl_step(&self) -> Result<Option<PageOutcome>> {
        let Some(entry) = self.ctx.frontier.dequeue_next()? else {
            return Ok(None);
        };
        let outcome = self.ctx.process(entry).await?;
        self.ctx.summary.lock().absorb(&outcome);
        Ok(Some(outcome))
    }

    /// Seed (or resume) and run `workers` concurrent workers until the
    /// frontier drains or the stop handle fires.
    pub async fn crawl(&self, seeds: &[String], workers: usize) -> Result<CrawlSummary> {
        let workers = workers.max(1);
        info!(
            "Starting crawl for {} with {} workers",
            self.ctx.classifier.self_domain(),
            workers
        );

        *self.ctx.summary.lock() = CrawlSummary::default();
        let seeded = self.seed(seeds)?;
        self.ctx.summary.lock().seeded = seeded;
        self.ctx.set_phase(CrawlPhase::Running);

        let mut worker_handles = Vec::new();
        for worker_id in 0..workers {
            let ctx = self.ctx.clone();
            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let result = ctx.run_worker(worker_id).await;
                if let Err(ref e) = result {
                    warn!("Worker {} aborting crawl: {}", worker_id, e);
                    ctx.stop.stop();
                }
                debug!("Worker {} finished", worker_id);
                result
            });
            worker_handles.push(handle);
        }

        let mut first_error = None;
        for joined in join_all(worker_handles).await {
            let result = joined.unwrap_or_else(|e| Err(ScanError::JoinError(e)));
            if let Err(e) = result
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }

        self.ctx.set_phase(CrawlPhase::Idle);
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut summary = self.ctx.summary.lock().clone();
        summary.stopped = self.ctx.stop.is_stopped();
        info!(
            "Crawl complete. {} pages crawled, {} links recorded, {} URLs failed",
            summary.pages_crawled, summary.links_recorded, summary.urls_failed
        );
        Ok(summary)
    }
}

impl WorkerContext {
    fn set_phase(&self, phase: CrawlPhase) {
        let mut current = self.phase.lock();
        if *current != phase {
            debug!("Crawl phase {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }

    async fn run_worker(&self, worker_id: usize) -> Result<()> {
        loop {
            if self.stop.is_stopped() {
                debug!("Worker {} observed stop", worker_id);
                return Ok(());
            }

            let Some(entry) = self.frontier.dequeue_next()? else {
                // In-flight entries count as outstanding, so an empty frontier
                // means no other worker can produce more work.
                if self.frontier.is_empty()? {
                    self.set_phase(CrawlPhase::Draining);
                    return Ok(());
                }
                tokio::time::sleep(self.idle_poll).await;
                continue;
            };

            if let Some(ref callback) = self.progress_callback {
                callback(worker_id, entry.url.clone());
            }

            let outcome = self.process(entry).await?;
            self.summary.lock().absorb(&outcome);
            if let Some(ref callback) = self.result_callback {
                callback(outcome);
            }
        }
    }

    async fn process(&self, entry: FrontierEntry) -> std::result::Result<PageOutcome, FrontierError> {
        let attempt = entry.attempts + 1;
        let start = Instant::now();

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&entry.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        let links = match fetched {
            Ok(links) => links,
            Err(e) => {
                let state = self.frontier.report_failure(&entry, self.max_retries)?;
                if state == EntryState::Failed {
                    warn!(
                        "Giving up on {} after {} attempts: {}",
                        entry.url, attempt, e
                    );
                } else {
                    warn!("Fetch failed for {} (attempt {}): {}", entry.url, attempt, e);
                }
                return Ok(PageOutcome::with_error(
                    entry.url,
                    attempt,
                    state,
                    e.to_string(),
                ));
            }
        };

        let mut outcome = PageOutcome::new(entry.url.clone(), attempt);
        outcome.response_time = start.elapsed();
        outcome.links_found = links.len();
        debug!("{} links found on {}", links.len(), entry.url);

        for raw in &links {
            let class = self.classifier.classify(raw);
            match &class {
                Classification::Malformed => outcome.malformed += 1,
                Classification::Internal(_) => outcome.internal += 1,
                Classification::BlockedExternal(_) => outcome.blocked += 1,
                Classification::SafeExternal(link) => {
                    outcome.safe_external += 1;
                    match self.store.record_if_absent(&LinkRecord::from(link)) {
                        Ok(true) => outcome.recorded += 1,
                        Ok(false) => {}
                        Err(e) => {
                            warn!("Could not record {}: {}", link.url, e);
                            outcome.store_errors += 1;
                        }
                    }
                }
            }

            if class.should_crawl()
                && let Some(link) = class.link()
                && self.frontier.enqueue_if_absent(&link.url)?
            {
                outcome.enqueued += 1;
            }
        }

        self.frontier.report_success(&entry)?;
        outcome.state = EntryState::Done;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::BlockedDomainSet;
    use crate::error::StoreError;
    use crate::frontier::{FrontierStats, MemoryFrontier};
    use crate::store::MemoryLinkStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    /// Serves canned link lists and counts fetches per URL. Unknown URLs fail.
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, Vec<String>>,
        calls: Mutex<HashMap<String, usize>>,
        delay: Option<Duration>,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            self.pages.insert(
                url.to_string(),
                links.iter().map(|l| l.to_string()).collect(),
            );
            self
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<Vec<String>, FetchError> {
            *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Other(format!("no page for {}", url)))
        }
    }

    struct BrokenStore;

    impl LinkStore for BrokenStore {
        fn record_if_absent(&self, _record: &LinkRecord) -> std::result::Result<bool, StoreError> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
    }

    struct BrokenFrontier;

    impl Frontier for BrokenFrontier {
        fn enqueue_if_absent(&self, _url: &str) -> std::result::Result<bool, FrontierError> {
            Ok(true)
        }
        fn dequeue_next(&self) -> std::result::Result<Option<FrontierEntry>, FrontierError> {
            Err(FrontierError::Storage("database is locked".to_string()))
        }
        fn report_success(&self, _entry: &FrontierEntry) -> std::result::Result<(), FrontierError> {
            Ok(())
        }
        fn report_failure(
            &self,
            _entry: &FrontierEntry,
            _max_retries: u32,
        ) -> std::result::Result<EntryState, FrontierError> {
            Ok(EntryState::Failed)
        }
        fn is_empty(&self) -> std::result::Result<bool, FrontierError> {
            Ok(true)
        }
        fn requeue_failed(&self) -> std::result::Result<usize, FrontierError> {
            Ok(0)
        }
        fn stats(&self) -> std::result::Result<FrontierStats, FrontierError> {
            Ok(FrontierStats::default())
        }
    }

    fn classifier(self_domain: &str, blocked: &[&str]) -> Arc<LinkClassifier> {
        Arc::new(LinkClassifier::new(
            self_domain,
            Arc::new(BlockedDomainSet::from_domains(blocked.iter().copied())),
        ))
    }

    fn seeds(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_step_partitions_links() {
        let fetcher = Arc::new(ScriptedFetcher::default().page(
            "https://site.com/",
            &["https://site.com/about", "https://evil.com/x", "https://site.com/"],
        ));
        let frontier = Arc::new(MemoryFrontier::new());
        let store = Arc::new(MemoryLinkStore::new());
        let crawler = Crawler::new(
            fetcher,
            frontier.clone(),
            store.clone(),
            classifier("site.com", &["evil.com"]),
        );

        assert!(crawler.seed(&seeds(&["https://site.com/"])).unwrap());
        let outcome = crawler.crawl_step().await.unwrap().unwrap();

        assert_eq!(outcome.internal, 2);
        assert_eq!(outcome.blocked, 1);
        assert_eq!(outcome.enqueued, 1);
        assert_eq!(outcome.state, EntryState::Done);

        assert_eq!(
            frontier.get("https://site.com/about").map(|e| e.state),
            Some(EntryState::Pending)
        );
        assert_eq!(
            frontier.get("https://site.com/").map(|e| e.state),
            Some(EntryState::Done)
        );
        assert!(frontier.get("https://evil.com/x").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_safe_external_links_are_recorded_and_crawled() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page(
                    "https://site.com/",
                    &["https://friend.org/", "https://friend.org/post", "mailto:x@site.com"],
                )
                .page("https://friend.org/", &["https://friend.org/post"])
                .page("https://friend.org/post", &[]),
        );
        let frontier = Arc::new(MemoryFrontier::new());
        let store = Arc::new(MemoryLinkStore::new());
        let crawler = Crawler::new(
            fetcher.clone(),
            frontier.clone(),
            store.clone(),
            classifier("site.com", &[]),
        );

        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 2).await.unwrap();

        assert!(summary.seeded);
        assert_eq!(summary.pages_crawled, 3);
        assert_eq!(summary.links_recorded, 2);
        assert_eq!(summary.links_malformed, 1);
        assert_eq!(store.get("https://friend.org/").map(|r| r.is_home), Some(true));
        assert_eq!(store.get("https://friend.org/post").map(|r| r.is_home), Some(false));
        assert_eq!(fetcher.calls("https://friend.org/post"), 1);
        assert_eq!(crawler.phase(), CrawlPhase::Idle);
    }

    #[tokio::test]
    async fn test_always_failing_url_fails_after_max_retries() {
        let fetcher = Arc::new(ScriptedFetcher::default().page("https://site.com/", &["https://site.com/broken"]));
        let frontier = Arc::new(MemoryFrontier::new());
        let crawler = Crawler::new(
            fetcher.clone(),
            frontier.clone(),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        )
        .with_max_retries(3);

        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 3).await.unwrap();

        assert_eq!(fetcher.calls("https://site.com/broken"), 3);
        assert_eq!(summary.fetch_failures, 3);
        assert_eq!(summary.urls_failed, 1);
        let entry = frontier.get("https://site.com/broken").unwrap();
        assert_eq!(entry.state, EntryState::Failed);
        assert_eq!(entry.attempts, 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Some(Duration::from_millis(200)),
            ..ScriptedFetcher::default().page("https://site.com/", &[])
        });
        let frontier = Arc::new(MemoryFrontier::new());
        let crawler = Crawler::new(
            fetcher.clone(),
            frontier.clone(),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        )
        .with_max_retries(2)
        .with_fetch_timeout(Duration::from_millis(20));

        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 1).await.unwrap();

        assert_eq!(summary.pages_crawled, 0);
        assert_eq!(fetcher.calls("https://site.com/"), 2);
        assert_eq!(
            frontier.get("https://site.com/").map(|e| e.state),
            Some(EntryState::Failed)
        );
    }

    #[tokio::test]
    async fn test_resume_does_not_reseed() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("https://site.com/", &[])
                .page("https://site.com/left-over", &[]),
        );
        let frontier = Arc::new(MemoryFrontier::new());
        frontier.enqueue_if_absent("https://site.com/left-over").unwrap();

        let crawler = Crawler::new(
            fetcher.clone(),
            frontier.clone(),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        );
        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 2).await.unwrap();

        assert!(!summary.seeded);
        assert_eq!(fetcher.calls("https://site.com/left-over"), 1);
        assert_eq!(fetcher.calls("https://site.com/"), 0);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_rejected() {
        let crawler = Crawler::new(
            Arc::new(ScriptedFetcher::default()),
            Arc::new(MemoryFrontier::new()),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        );
        let result = crawler.crawl(&seeds(&["not a url"]), 1).await;
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_store_errors_do_not_stop_crawl() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("https://site.com/", &["https://friend.org/"])
                .page("https://friend.org/", &[]),
        );
        let crawler = Crawler::new(
            fetcher.clone(),
            Arc::new(MemoryFrontier::new()),
            Arc::new(BrokenStore),
            classifier("site.com", &[]),
        );

        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 1).await.unwrap();

        assert_eq!(summary.store_errors, 1);
        assert_eq!(summary.links_recorded, 0);
        // the link stays in the frontier even though recording failed
        assert_eq!(fetcher.calls("https://friend.org/"), 1);
    }

    #[tokio::test]
    async fn test_frontier_errors_abort_crawl() {
        let crawler = Crawler::new(
            Arc::new(ScriptedFetcher::default()),
            Arc::new(BrokenFrontier),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        );
        let result = crawler.crawl(&seeds(&["https://site.com/"]), 3).await;
        assert!(matches!(result, Err(ScanError::Frontier(_))));
        assert_eq!(crawler.phase(), CrawlPhase::Idle);
    }

    #[tokio::test]
    async fn test_stop_leaves_pending_work() {
        let fetcher = Arc::new(ScriptedFetcher::default().page("https://site.com/", &[]));
        let frontier = Arc::new(MemoryFrontier::new());
        let crawler = Crawler::new(
            fetcher.clone(),
            frontier.clone(),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        );

        crawler.stop_handle().stop();
        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 2).await.unwrap();

        assert!(summary.stopped);
        assert_eq!(fetcher.calls("https://site.com/"), 0);
        assert!(!frontier.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_each_url_fetched_once_with_many_workers() {
        let mut fetcher = ScriptedFetcher {
            delay: Some(Duration::from_millis(5)),
            ..ScriptedFetcher::default()
        };
        let hub: Vec<String> = (1..=20).map(|i| format!("https://site.com/page{}", i)).collect();
        let hub_refs: Vec<&str> = hub.iter().map(String::as_str).collect();
        fetcher = fetcher.page("https://site.com/", &hub_refs);
        for url in &hub {
            // every page links to every other page
            fetcher = fetcher.page(url, &hub_refs);
        }
        let fetcher = Arc::new(fetcher);

        let crawler = Crawler::new(
            fetcher.clone(),
            Arc::new(MemoryFrontier::new()),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        );
        let summary = crawler.crawl(&seeds(&["https://site.com/"]), 5).await.unwrap();

        assert_eq!(summary.pages_crawled, 21);
        assert_eq!(fetcher.calls("https://site.com/"), 1);
        for url in &hub {
            assert_eq!(fetcher.calls(url), 1, "{} fetched more than once", url);
        }
    }

    #[tokio::test]
    async fn test_progress_and_result_callbacks() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("https://site.com/", &["https://site.com/a"])
                .page("https://site.com/a", &[]),
        );
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let outcomes: Arc<Mutex<Vec<PageOutcome>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let outcomes_clone = outcomes.clone();

        let crawler = Crawler::new(
            fetcher,
            Arc::new(MemoryFrontier::new()),
            Arc::new(MemoryLinkStore::new()),
            classifier("site.com", &[]),
        )
        .with_progress_callback(Arc::new(move |_worker_id, url| seen_clone.lock().push(url)))
        .with_result_callback(Arc::new(move |outcome| outcomes_clone.lock().push(outcome)));

        crawler.crawl(&seeds(&["https://site.com/"]), 1).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["https://site.com/".to_string(), "https://site.com/a".to_string()]
        );
        assert!(outcomes.lock().iter().all(|o| o.is_success()));
    }

    /// Crawl a small mock site over real HTTP
    #[tokio::test]
    async fn test_http_crawl_against_mock_server() {
        let mock_server = MockServer::start().await;
        let root_html = format!(
            r#"<html><body>
                <a href="{}/page1">Page 1</a>
                <a href="/page2">Page 2</a>
                <a href="https://friend.example/">Friend</a>
                <a href="https://tracker.example/pixel">Tracker</a>
            </body></html>"#,
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(root_html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        for page in ["/page1", "/page2"] {
            Mock::given(method("GET"))
                .and(path(page))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/html")
                        .set_body_bytes(b"<html><body>leaf</body></html>"),
                )
                .mount(&mock_server)
                .await;
        }

        // Offline fetcher for the external site, HTTP for everything on the mock server
        struct SplitFetcher {
            http: crate::fetcher::HttpFetcher,
            host: String,
        }

        #[async_trait]
        impl Fetcher for SplitFetcher {
            async fn fetch(&self, url: &str) -> std::result::Result<Vec<String>, FetchError> {
                if url.contains(&self.host) {
                    self.http.fetch(url).await
                } else {
                    Ok(Vec::new())
                }
            }
        }

        let host = Url::parse(&mock_server.uri())
            .unwrap()
            .host_str()
            .unwrap()
            .to_string();
        let fetcher = Arc::new(SplitFetcher {
            http: crate::fetcher::HttpFetcher::new().unwrap(),
            host: host.clone(),
        });
        let store = Arc::new(MemoryLinkStore::new());
        let frontier = Arc::new(MemoryFrontier::new());
        let crawler = Crawler::new(
            fetcher,
            frontier.clone(),
            store.clone(),
            classifier(&host, &["tracker.example"]),
        );

        let seed = format!("{}/", mock_server.uri());
        let summary = crawler.crawl(&[seed], 2).await.unwrap();

        // root, page1, page2 and the friend site
        assert_eq!(summary.pages_crawled, 4);
        assert_eq!(summary.links_blocked, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("https://friend.example/").is_some());
        assert!(frontier.get("https://tracker.example/pixel").is_none());
    }
}
