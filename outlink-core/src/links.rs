use crate::data::current_timestamp;
use outlink_scanner::{LinkRecord, LinkStore, StoreError};
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use std::sync::Arc;

/// Record store over the `page` table. Uniqueness comes from the primary key
/// and `INSERT OR IGNORE`, not from any lock held by callers.
#[derive(Clone)]
pub struct SqliteLinkStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLinkStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl LinkStore for SqliteLinkStore {
    fn record_if_absent(&self, record: &LinkRecord) -> Result<bool, StoreError> {
        let inserted = self
            .conn
            .lock()
            .execute(
                "INSERT OR IGNORE INTO page (url, is_home, discovered_at) VALUES (?1, ?2, ?3)",
                params![&record.url, record.is_home, current_timestamp()],
            )
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(inserted > 0)
    }
}
