use crate::blocklist::BlockedDomainSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// A link found on a crawled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub url: String,
    /// The URL's path is exactly `/`.
    pub is_home: bool,
}

/// Outcome of classifying one raw link. Every link lands in exactly one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not a URL with a scheme and host. Dropped.
    Malformed,
    /// Belongs to the crawled site. Crawled, never recorded.
    Internal(DiscoveredLink),
    /// Matches the blocklist. Neither crawled nor recorded.
    BlockedExternal(DiscoveredLink),
    /// Crawled and recorded.
    SafeExternal(DiscoveredLink),
}

impl Classification {
    pub fn link(&self) -> Option<&DiscoveredLink> {
        match self {
            Classification::Malformed => None,
            Classification::Internal(link)
            | Classification::BlockedExternal(link)
            | Classification::SafeExternal(link) => Some(link),
        }
    }

    pub fn should_crawl(&self) -> bool {
        matches!(
            self,
            Classification::Internal(_) | Classification::SafeExternal(_)
        )
    }

    pub fn should_record(&self) -> bool {
        matches!(self, Classification::SafeExternal(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Malformed => "malformed",
            Classification::Internal(_) => "internal",
            Classification::BlockedExternal(_) => "blocked_external",
            Classification::SafeExternal(_) => "safe_external",
        }
    }
}

/// Classify a raw link discovered on a page.
///
/// Internal detection is substring containment of `self_domain`, checked
/// before the blocklist, so an internal link is never blocked.
pub fn classify(raw_url: &str, self_domain: &str, blocked: &BlockedDomainSet) -> Classification {
    let parsed = match Url::parse(raw_url) {
        Ok(parsed) if parsed.host_str().is_some() => parsed,
        _ => return Classification::Malformed,
    };

    let link = DiscoveredLink {
        url: raw_url.to_string(),
        is_home: parsed.path() == "/",
    };

    if !self_domain.is_empty() && raw_url.contains(self_domain) {
        Classification::Internal(link)
    } else if blocked.is_blocked(raw_url) {
        Classification::BlockedExternal(link)
    } else {
        Classification::SafeExternal(link)
    }
}

/// Classifier bound to one site and one blocklist, shared by all workers.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    self_domain: String,
    blocked: Arc<BlockedDomainSet>,
}

impl LinkClassifier {
    pub fn new(self_domain: impl Into<String>, blocked: Arc<BlockedDomainSet>) -> Self {
        Self {
            self_domain: self_domain.into(),
            blocked,
        }
    }

    pub fn self_domain(&self) -> &str {
        &self.self_domain
    }

    pub fn blocked(&self) -> &BlockedDomainSet {
        &self.blocked
    }

    pub fn classify(&self, raw_url: &str) -> Classification {
        classify(raw_url, &self.self_domain, &self.blocked)
    }
}
