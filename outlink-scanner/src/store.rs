use crate::classify::DiscoveredLink;
use crate::error::StoreError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A discovered external link as it is persisted for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub is_home: bool,
}

impl From<&DiscoveredLink> for LinkRecord {
    fn from(link: &DiscoveredLink) -> Self {
        Self {
            url: link.url.clone(),
            is_home: link.is_home,
        }
    }
}

/// Insert-or-ignore sink for discovered external links.
pub trait LinkStore: Send + Sync {
    /// Returns `true` if the record was new. Existing records are never updated.
    fn record_if_absent(&self, record: &LinkRecord) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct MemoryLinkStore {
    records: Mutex<HashMap<String, LinkRecord>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn get(&self, url: &str) -> Option<LinkRecord> {
        self.records.lock().get(url).cloned()
    }
}

impl LinkStore for MemoryLinkStore {
    fn record_if_absent(&self, record: &LinkRecord) -> Result<bool, StoreError> {
        let mut records = self.records.lock();
        if records.contains_key(&record.url) {
            return Ok(false);
        }
        records.insert(record.url.clone(), record.clone());
        Ok(true)
    }
}
