use crate::frontier::EntryState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one dequeued URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    pub url: String,
    /// Attempt number for this fetch, starting at 1.
    pub attempt: u32,
    /// State the frontier entry was moved to.
    pub state: EntryState,
    pub response_time: Duration,
    pub links_found: usize,
    pub internal: usize,
    pub blocked: usize,
    pub malformed: usize,
    pub safe_external: usize,
    pub recorded: usize,
    pub enqueued: usize,
    pub store_errors: usize,
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn new(url: String, attempt: u32) -> Self {
        Self {
            url,
            attempt,
            state: EntryState::InFlight,
            response_time: Duration::from_secs(0),
            links_found: 0,
            internal: 0,
            blocked: 0,
            malformed: 0,
            safe_external: 0,
            recorded: 0,
            enqueued: 0,
            store_errors: 0,
            error: None,
        }
    }

    pub fn with_error(url: String, attempt: u32, state: EntryState, error: String) -> Self {
        Self {
            state,
            error: Some(error),
            ..Self::new(url, attempt)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for one crawl run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seeded: bool,
    pub pages_crawled: usize,
    pub fetch_failures: usize,
    pub urls_failed: usize,
    pub links_found: usize,
    pub links_recorded: usize,
    pub links_enqueued: usize,
    pub links_blocked: usize,
    pub links_malformed: usize,
    pub store_errors: usize,
    pub stopped: bool,
}

impl CrawlSummary {
    pub fn absorb(&mut self, outcome: &PageOutcome) {
        if outcome.is_success() {
            self.pages_crawled += 1;
        } else {
            self.fetch_failures += 1;
            if outcome.state == EntryState::Failed {
                self.urls_failed += 1;
            }
        }
        self.links_found += outcome.links_found;
        self.links_recorded += outcome.recorded;
        self.links_enqueued += outcome.enqueued;
        self.links_blocked += outcome.blocked;
        self.links_malformed += outcome.malformed;
        self.store_errors += outcome.store_errors;
    }
}
