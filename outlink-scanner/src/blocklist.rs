use crate::error::ParseError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use url::Url;

/// Default hosts-format list used when no other source is configured.
pub const DEFAULT_BLOCKLIST_URL: &str = "https://blocklistproject.github.io/Lists/everything.txt";

/// How a URL is tested against the blocked domains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The raw URL string contains a blocked domain anywhere.
    #[default]
    Substring,
    /// The URL's host equals a blocked domain or is a subdomain of one.
    HostSuffix,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::Substring => "substring",
            MatchPolicy::HostSuffix => "host_suffix",
        }
    }

}

impl FromStr for MatchPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(MatchPolicy::Substring),
            "host_suffix" | "host-suffix" | "suffix" => Ok(MatchPolicy::HostSuffix),
            _ => Err(ParseError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Immutable set of blocked domains, built once at startup.
///
/// The default [`MatchPolicy::Substring`] treats a URL as blocked when any
/// blocked domain occurs inside it, so `bad.example.com.evil.org` matches
/// `bad.example.com`. Lookups enumerate the URL's substrings up to the length
/// of the longest domain instead of scanning the whole set, which keeps the
/// check cheap for lists with hundreds of thousands of entries.
#[derive(Debug, Clone, Default)]
pub struct BlockedDomainSet {
    domains: HashSet<String>,
    longest: usize,
    policy: MatchPolicy,
}

impl BlockedDomainSet {
    /// Parse hosts-format text (`<ip-or-marker> <domain>` per line).
    ///
    /// Comment lines and lines with fewer than two tokens are skipped. Only
    /// an absent source is an error; a list of nothing but comments yields an
    /// empty set.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptySource);
        }

        let mut set = Self::default();
        let mut skipped = 0usize;

        for line in raw.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_whitespace().nth(1) {
                Some(domain) => set.insert(domain),
                None => skipped += 1,
            }
        }

        debug!(
            "Parsed blocklist: {} domains, {} malformed lines skipped",
            set.len(),
            skipped
        );
        Ok(set)
    }

    /// Read and parse a cached blocklist file.
    pub fn load_file(path: &Path) -> Result<Self, ParseError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Build a set directly from domain strings.
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for domain in domains {
            set.insert(domain.as_ref());
        }
        set
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn insert(&mut self, domain: &str) {
        if domain.is_empty() {
            return;
        }
        self.longest = self.longest.max(domain.len());
        self.domains.insert(domain.to_string());
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn is_blocked(&self, url: &str) -> bool {
        if self.domains.is_empty() {
            return false;
        }
        match self.policy {
            MatchPolicy::Substring => self.contains_blocked_substring(url),
            MatchPolicy::HostSuffix => self.host_has_blocked_suffix(url),
        }
    }

    fn contains_blocked_substring(&self, url: &str) -> bool {
        let bounds: Vec<usize> = url
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(url.len()))
            .collect();

        for (i, &start) in bounds.iter().enumerate() {
            for &end in &bounds[i + 1..] {
                if end - start > self.longest {
                    break;
                }
                if self.domains.contains(&url[start..end]) {
                    return true;
                }
            }
        }
        false
    }

    fn host_has_blocked_suffix(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        else {
            return false;
        };

        let mut candidate = host.as_str();
        loop {
            if self.domains.contains(candidate) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, rest)) if !rest.is_empty() => candidate = rest,
                _ => return false,
            }
        }
    }
}

/// Download the raw blocklist text.
pub async fn download(client: &Client, source: &str) -> Result<String, ParseError> {
    info!("Downloading blocklist from {}", source);
    let response = client.get(source).send().await?.error_for_status()?;
    let body = response.text().await?;
    info!("Blocklist download completed ({} bytes)", body.len());
    Ok(body)
}
