use crate::config::CrawlConfig;
use crate::data::{Database, SessionStatus};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use outlink_scanner::blocklist::{self, BlockedDomainSet};
use outlink_scanner::{
    CrawlSummary, Crawler, Fetcher, Frontier, FrontierStats, LinkClassifier, PageOutcome,
    ParseError, StopHandle,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub config: CrawlConfig,
    pub blocklist: BlockedDomainSet,
    pub show_progress_bars: bool,
    pub stop: Option<StopHandle>,
}

/// Callback for reporting individual page outcomes as they come in
pub type CrawlResultCallback = Arc<dyn Fn(PageOutcome) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub session_id: String,
    pub summary: CrawlSummary,
    pub frontier: FrontierStats,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Obtain the blocklist for a run.
///
/// With refresh enabled the list is downloaded and written to the cache
/// file; if the download fails an existing cache file is used instead. With
/// refresh disabled only the cache file is read.
pub async fn load_blocklist(config: &CrawlConfig) -> std::result::Result<BlockedDomainSet, ParseError> {
    let path = config.blocklist_path();

    let set = if config.refresh_blocklist {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.fetch_timeout_secs.max(60)))
            .build()?;

        match blocklist::download(&client, &config.blocklist_url).await {
            Ok(raw) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, &raw)?;
                BlockedDomainSet::parse(&raw)?
            }
            Err(e) if path.exists() => {
                warn!(
                    "Blocklist download failed ({}), using cached copy at {}",
                    e,
                    path.display()
                );
                BlockedDomainSet::load_file(&path)?
            }
            Err(e) => return Err(e),
        }
    } else {
        BlockedDomainSet::load_file(&path)?
    };

    info!("Loaded {} blocked domains", set.len());
    Ok(set.with_policy(config.match_policy))
}

/// Execute a crawl against the database's frontier and link store.
///
/// Entries left in flight by an earlier run are returned to pending before
/// seeding, so only one crawl may run against a database at a time. The run is recorded as a crawl session, which ends as completed,
/// cancelled (stopped early) or failed.
pub async fn execute_crawl(
    db: &Database,
    fetcher: Arc<dyn Fetcher>,
    options: CrawlOptions,
    result_callback: Option<CrawlResultCallback>,
) -> Result<CrawlRun> {
    let CrawlOptions {
        config,
        blocklist,
        show_progress_bars,
        stop,
    } = options;

    config.validate()?;

    // Entries still in flight were being fetched by a run that never finished
    db.recover_in_flight()?;

    let session_id = db.create_session(&config.seeds_json()?, Some(&config.to_json()?))?;
    info!("Started crawl session {}", session_id);

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let frontier = Arc::new(db.frontier());
    let classifier = Arc::new(LinkClassifier::new(
        config.self_domain.clone(),
        Arc::new(blocklist),
    ));

    let mut crawler = Crawler::new(
        fetcher,
        frontier.clone(),
        Arc::new(db.link_store()),
        classifier,
    )
    .with_max_retries(config.max_retries)
    .with_fetch_timeout(Duration::from_secs(config.fetch_timeout_secs));

    if let Some(stop) = stop {
        crawler = crawler.with_stop_handle(stop);
    }

    if let Some(pb) = progress_bar.clone() {
        let count = processed_count.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |worker_id: usize, url: String| {
            let count = count.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!(
                "[{}] worker {}: {}",
                count,
                worker_id,
                extract_url_path(&url)
            ));
        }));
    }

    if let Some(cb) = result_callback {
        crawler = crawler.with_result_callback(Arc::new(move |outcome: PageOutcome| cb(outcome)));
    }

    let result = crawler.crawl(&config.seeds, config.workers).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl finished, {} URLs processed", total));
    }

    match result {
        Ok(summary) => {
            let status = if summary.stopped {
                SessionStatus::Cancelled
            } else {
                SessionStatus::Completed
            };
            db.finish_session(&session_id, status)?;
            let frontier = frontier.stats()?;
            Ok(CrawlRun {
                session_id,
                summary,
                frontier,
            })
        }
        Err(e) => {
            if let Err(db_err) = db.fail_session(&session_id) {
                warn!("Could not mark session {} as failed: {}", session_id, db_err);
            }
            Err(e.into())
        }
    }
}
