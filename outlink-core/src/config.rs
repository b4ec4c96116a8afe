use crate::error::{CoreError, Result};
use outlink_scanner::MatchPolicy;
use outlink_scanner::blocklist::DEFAULT_BLOCKLIST_URL;
use outlink_scanner::crawler::{DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};
use outlink_scanner::fetcher::DEFAULT_USER_AGENT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/outlink/";
pub const DATABASE_FILE: &str = "outlink.db";
pub const BLOCKLIST_FILE: &str = "block-list.txt";
pub const DEFAULT_SEED: &str = "https://www.blogs-collection.com/";
pub const DEFAULT_SELF_DOMAIN: &str = "blogs-collection.com";

/// Settings for one crawl run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Enqueued only when the frontier has no outstanding work.
    pub seeds: Vec<String>,
    /// Links containing this string are internal.
    pub self_domain: String,
    pub workers: usize,
    pub max_retries: u32,
    pub fetch_timeout_secs: u64,
    /// Download a fresh blocklist before crawling instead of reusing the cached file.
    pub refresh_blocklist: bool,
    pub blocklist_url: String,
    pub blocklist_path: PathBuf,
    pub database_path: PathBuf,
    pub match_policy: MatchPolicy,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let config_dir = PathBuf::from(DEFAULT_CONFIG_DIR);
        Self {
            seeds: vec![DEFAULT_SEED.to_string()],
            self_domain: DEFAULT_SELF_DOMAIN.to_string(),
            workers: DEFAULT_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            fetch_timeout_secs: 30,
            refresh_blocklist: true,
            blocklist_url: DEFAULT_BLOCKLIST_URL.to_string(),
            blocklist_path: config_dir.join(BLOCKLIST_FILE),
            database_path: config_dir.join(DATABASE_FILE),
            match_policy: MatchPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(expand_path(path))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Point the database and cached blocklist at `dir`.
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.database_path = dir.join(DATABASE_FILE);
        self.blocklist_path = dir.join(BLOCKLIST_FILE);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(CoreError::Config("at least one seed URL is required".to_string()));
        }
        for seed in &self.seeds {
            let parsed = Url::parse(seed)
                .map_err(|e| CoreError::Config(format!("invalid seed URL '{}': {}", seed, e)))?;
            if parsed.host_str().is_none() {
                return Err(CoreError::Config(format!("seed URL '{}' has no host", seed)));
            }
        }
        if self.self_domain.trim().is_empty() {
            return Err(CoreError::Config("self domain must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(CoreError::Config("workers must be at least 1".to_string()));
        }
        if self.max_retries == 0 {
            return Err(CoreError::Config("max retries must be at least 1".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(CoreError::Config("fetch timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        expand_path(&self.database_path)
    }

    pub fn blocklist_path(&self) -> PathBuf {
        expand_path(&self.blocklist_path)
    }

    pub fn seeds_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.seeds)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Expand a leading `~` in a path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Site identity used for internal-link detection: the seed's host without
/// a leading `www.`.
pub fn derive_self_domain(seed: &str) -> Option<String> {
    let parsed = Url::parse(seed).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
