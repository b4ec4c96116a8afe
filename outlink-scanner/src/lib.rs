pub mod blocklist;
pub mod classify;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod frontier;
pub mod result;
pub mod store;

pub use blocklist::{BlockedDomainSet, MatchPolicy};
pub use classify::{Classification, DiscoveredLink, LinkClassifier, classify};
pub use crawler::{CrawlPhase, Crawler, ProgressCallback, ResultCallback, StopHandle};
pub use error::{FetchError, FrontierError, ParseError, ScanError, StoreError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use frontier::{EntryState, Frontier, FrontierEntry, FrontierStats, MemoryFrontier};
pub use result::{CrawlSummary, PageOutcome};
pub use store::{LinkRecord, LinkStore, MemoryLinkStore};
