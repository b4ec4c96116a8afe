use crate::error::FrontierError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    Pending,
    InFlight,
    Done,
    Failed,
}

impl EntryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Pending => "pending",
            EntryState::InFlight => "in_flight",
            EntryState::Done => "done",
            EntryState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FrontierError> {
        match s {
            "pending" => Ok(EntryState::Pending),
            "in_flight" => Ok(EntryState::InFlight),
            "done" => Ok(EntryState::Done),
            "failed" => Ok(EntryState::Failed),
            other => Err(FrontierError::UnknownState(other.to_string())),
        }
    }

    /// Pending and in-flight entries still represent outstanding work.
    pub fn is_live(&self) -> bool {
        matches!(self, EntryState::Pending | EntryState::InFlight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    pub state: EntryState,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierStats {
    pub pending: u64,
    pub in_flight: u64,
    pub done: u64,
    pub failed: u64,
}

impl FrontierStats {
    pub fn total(&self) -> u64 {
        self.pending + self.in_flight + self.done + self.failed
    }

    pub fn add(&mut self, state: EntryState, count: u64) {
        match state {
            EntryState::Pending => self.pending += count,
            EntryState::InFlight => self.in_flight += count,
            EntryState::Done => self.done += count,
            EntryState::Failed => self.failed += count,
        }
    }
}

/// Deduplicated, retryable work queue keyed on the exact URL string.
///
/// Every method is atomic with respect to the others. Implementations are
/// called from several workers at once and must never be held across a fetch.
pub trait Frontier: Send + Sync {
    /// Add `url` as pending unless an entry for it already exists in any state.
    /// Returns whether a new entry was created.
    fn enqueue_if_absent(&self, url: &str) -> Result<bool, FrontierError>;

    /// Take the oldest pending entry and mark it in flight.
    fn dequeue_next(&self) -> Result<Option<FrontierEntry>, FrontierError>;

    fn report_success(&self, entry: &FrontierEntry) -> Result<(), FrontierError>;

    /// Count a failed attempt. The entry goes back to the end of the queue
    /// while `attempts < max_retries`, otherwise it becomes terminally failed.
    fn report_failure(
        &self,
        entry: &FrontierEntry,
        max_retries: u32,
    ) -> Result<EntryState, FrontierError>;

    /// True when nothing is pending or in flight.
    fn is_empty(&self) -> Result<bool, FrontierError>;

    /// Put every failed entry back in the queue with a fresh attempt count.
    fn requeue_failed(&self) -> Result<usize, FrontierError>;

    fn stats(&self) -> Result<FrontierStats, FrontierError>;
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, FrontierEntry>,
    queue: VecDeque<String>,
}

/// Non-persistent frontier for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryFrontier {
    state: Mutex<MemoryState>,
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<FrontierEntry> {
        self.state.lock().entries.get(url).cloned()
    }
}

impl Frontier for MemoryFrontier {
    fn enqueue_if_absent(&self, url: &str) -> Result<bool, FrontierError> {
        let mut state = self.state.lock();
        if state.entries.contains_key(url) {
            return Ok(false);
        }
        state.entries.insert(
            url.to_string(),
            FrontierEntry {
                url: url.to_string(),
                state: EntryState::Pending,
                attempts: 0,
            },
        );
        state.queue.push_back(url.to_string());
        Ok(true)
    }

    fn dequeue_next(&self) -> Result<Option<FrontierEntry>, FrontierError> {
        let mut state = self.state.lock();
        while let Some(url) = state.queue.pop_front() {
            if let Some(entry) = state.entries.get_mut(&url)
                && entry.state == EntryState::Pending
            {
                entry.state = EntryState::InFlight;
                return Ok(Some(entry.clone()));
            }
        }
        Ok(None)
    }

    fn report_success(&self, entry: &FrontierEntry) -> Result<(), FrontierError> {
        let mut state = self.state.lock();
        if let Some(stored) = state.entries.get_mut(&entry.url)
            && stored.state == EntryState::InFlight
        {
            stored.state = EntryState::Done;
        }
        Ok(())
    }

    fn report_failure(
        &self,
        entry: &FrontierEntry,
        max_retries: u32,
    ) -> Result<EntryState, FrontierError> {
        let mut state = self.state.lock();
        let Some(stored) = state.entries.get_mut(&entry.url) else {
            return Err(FrontierError::Storage(format!(
                "no frontier entry for {}",
                entry.url
            )));
        };
        if stored.state != EntryState::InFlight {
            return Ok(stored.state);
        }

        stored.attempts += 1;
        if stored.attempts < max_retries {
            stored.state = EntryState::Pending;
            state.queue.push_back(entry.url.clone());
            Ok(EntryState::Pending)
        } else {
            stored.state = EntryState::Failed;
            Ok(EntryState::Failed)
        }
    }

    fn is_empty(&self) -> Result<bool, FrontierError> {
        let state = self.state.lock();
        Ok(!state.entries.values().any(|e| e.state.is_live()))
    }

    fn requeue_failed(&self) -> Result<usize, FrontierError> {
        let mut state = self.state.lock();
        let mut failed: Vec<String> = Vec::new();
        for entry in state.entries.values_mut() {
            if entry.state == EntryState::Failed {
                entry.state = EntryState::Pending;
                entry.attempts = 0;
                failed.push(entry.url.clone());
            }
        }
        failed.sort();
        let count = failed.len();
        state.queue.extend(failed);
        Ok(count)
    }

    fn stats(&self) -> Result<FrontierStats, FrontierError> {
        let state = self.state.lock();
        let mut stats = FrontierStats::default();
        for entry in state.entries.values() {
            stats.add(entry.state, 1);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_enqueue_is_idempotent() {
        let frontier = MemoryFrontier::new();
        assert!(frontier.enqueue_if_absent("https://a.com/").unwrap());
        assert!(!frontier.enqueue_if_absent("https://a.com/").unwrap());
        assert_eq!(frontier.stats().unwrap().pending, 1);
    }

    #[test]
    fn test_fifo_order() {
        let frontier = MemoryFrontier::new();
        for url in ["https://a.com/1", "https://a.com/2", "https://a.com/3"] {
            frontier.enqueue_if_absent(url).unwrap();
        }
        let first = frontier.dequeue_next().unwrap().unwrap();
        assert_eq!(first.url, "https://a.com/1");
        assert_eq!(first.state, EntryState::InFlight);
        assert_eq!(frontier.dequeue_next().unwrap().unwrap().url, "https://a.com/2");
    }

    #[test]
    fn test_retry_bound() {
        let frontier = MemoryFrontier::new();
        frontier.enqueue_if_absent("https://down.com/").unwrap();

        let mut failures = 0;
        while let Some(entry) = frontier.dequeue_next().unwrap() {
            failures += 1;
            let next = frontier.report_failure(&entry, 3).unwrap();
            if failures < 3 {
                assert_eq!(next, EntryState::Pending);
            } else {
                assert_eq!(next, EntryState::Failed);
            }
        }

        assert_eq!(failures, 3);
        let entry = frontier.get("https://down.com/").unwrap();
        assert_eq!(entry.state, EntryState::Failed);
        assert_eq!(entry.attempts, 3);
        assert!(frontier.is_empty().unwrap());
        // terminal: re-discovery does not revive it
        assert!(!frontier.enqueue_if_absent("https://down.com/").unwrap());
        assert!(frontier.dequeue_next().unwrap().is_none());
    }

    #[test]
    fn test_requeue_failed() {
        let frontier = MemoryFrontier::new();
        frontier.enqueue_if_absent("https://down.com/").unwrap();
        let entry = frontier.dequeue_next().unwrap().unwrap();
        frontier.report_failure(&entry, 1).unwrap();

        assert_eq!(frontier.requeue_failed().unwrap(), 1);
        let again = frontier.dequeue_next().unwrap().unwrap();
        assert_eq!(again.url, "https://down.com/");
        assert_eq!(again.attempts, 0);
    }

    #[test]
    fn test_done_entries_do_not_count_as_live() {
        let frontier = MemoryFrontier::new();
        frontier.enqueue_if_absent("https://a.com/").unwrap();
        assert!(!frontier.is_empty().unwrap());

        let entry = frontier.dequeue_next().unwrap().unwrap();
        assert!(!frontier.is_empty().unwrap());

        frontier.report_success(&entry).unwrap();
        assert!(frontier.is_empty().unwrap());
        assert_eq!(frontier.stats().unwrap().done, 1);
    }

    #[test]
    fn test_concurrent_enqueue_dedup() {
        let frontier = Arc::new(MemoryFrontier::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = frontier.clone();
                std::thread::spawn(move || frontier.enqueue_if_absent("https://same.com/").unwrap())
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|created| *created)
            .count();
        assert_eq!(created, 1);
        assert_eq!(frontier.stats().unwrap().total(), 1);
    }
}
