use std::time::Duration;
use thiserror::Error;

/// Blocklist source could not be turned into a domain set.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Blocklist source is empty")]
    EmptySource,

    #[error("Blocklist download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Blocklist IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown match policy '{0}'")]
    UnknownPolicy(String),
}

/// Per-URL fetch failure. Always retryable from the frontier's point of view.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Fetch failed: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum FrontierError {
    #[error("Frontier storage error: {0}")]
    Storage(String),

    #[error("Unknown frontier state '{0}'")]
    UnknownState(String),
}

/// Errors that abort a whole crawl run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Blocklist error: {0}")]
    Blocklist(#[from] ParseError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] FrontierError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
