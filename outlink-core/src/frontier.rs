use crate::data::current_timestamp;
use outlink_scanner::{EntryState, Frontier, FrontierEntry, FrontierError, FrontierStats};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Arc;
use tracing::debug;

fn storage(e: rusqlite::Error) -> FrontierError {
    FrontierError::Storage(e.to_string())
}

/// Frontier persisted in the `frontier` table.
///
/// Every operation runs under the connection lock, and multi-statement
/// operations run in a transaction, so a crash never leaves half an update.
#[derive(Clone)]
pub struct SqliteFrontier {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFrontier {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn get(&self, url: &str) -> Result<Option<FrontierEntry>, FrontierError> {
        let conn = self.conn.lock();
        let row: Option<(String, u32)> = conn
            .query_row(
                "SELECT state, attempts FROM frontier WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage)?;

        row.map(|(state, attempts)| {
            Ok(FrontierEntry {
                url: url.to_string(),
                state: EntryState::parse(&state)?,
                attempts,
            })
        })
        .transpose()
    }
}

impl Frontier for SqliteFrontier {
    fn enqueue_if_absent(&self, url: &str) -> Result<bool, FrontierError> {
        let now = current_timestamp();
        let inserted = self
            .conn
            .lock()
            .execute(
                "INSERT OR IGNORE INTO frontier (url, state, attempts, position, discovered_at, updated_at)
                 VALUES (?1, 'pending', 0, COALESCE((SELECT MAX(position) FROM frontier), 0) + 1, ?2, ?2)",
                params![url, now],
            )
            .map_err(storage)?;
        Ok(inserted > 0)
    }

    fn dequeue_next(&self) -> Result<Option<FrontierEntry>, FrontierError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;

        let next: Option<(String, u32)> = tx
            .query_row(
                "SELECT url, attempts FROM frontier WHERE state = 'pending' ORDER BY position LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage)?;

        let Some((url, attempts)) = next else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE frontier SET state = 'in_flight', updated_at = ?1 WHERE url = ?2",
            params![current_timestamp(), &url],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)?;

        Ok(Some(FrontierEntry {
            url,
            state: EntryState::InFlight,
            attempts,
        }))
    }

    fn report_success(&self, entry: &FrontierEntry) -> Result<(), FrontierError> {
        self.conn
            .lock()
            .execute(
                "UPDATE frontier SET state = 'done', updated_at = ?1 WHERE url = ?2 AND state = 'in_flight'",
                params![current_timestamp(), &entry.url],
            )
            .map_err(storage)?;
        Ok(())
    }

    fn report_failure(
        &self,
        entry: &FrontierEntry,
        max_retries: u32,
    ) -> Result<EntryState, FrontierError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;

        let current: Option<(String, u32)> = tx
            .query_row(
                "SELECT state, attempts FROM frontier WHERE url = ?1",
                params![&entry.url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage)?;

        let Some((state, attempts)) = current else {
            return Err(FrontierError::Storage(format!(
                "no frontier entry for {}",
                entry.url
            )));
        };
        let state = EntryState::parse(&state)?;
        if state != EntryState::InFlight {
            return Ok(state);
        }

        let attempts = attempts + 1;
        let now = current_timestamp();
        let next = if attempts < max_retries {
            tx.execute(
                "UPDATE frontier
                 SET state = 'pending', attempts = ?1, updated_at = ?2,
                     position = (SELECT MAX(position) FROM frontier) + 1
                 WHERE url = ?3",
                params![attempts, now, &entry.url],
            )
            .map_err(storage)?;
            EntryState::Pending
        } else {
            tx.execute(
                "UPDATE frontier SET state = 'failed', attempts = ?1, updated_at = ?2 WHERE url = ?3",
                params![attempts, now, &entry.url],
            )
            .map_err(storage)?;
            EntryState::Failed
        };
        tx.commit().map_err(storage)?;

        debug!(
            "{} failed attempt {}/{}, now {}",
            entry.url,
            attempts,
            max_retries,
            next.as_str()
        );
        Ok(next)
    }

    fn is_empty(&self) -> Result<bool, FrontierError> {
        let live: bool = self
            .conn
            .lock()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM frontier WHERE state IN ('pending', 'in_flight'))",
                [],
                |row| row.get(0),
            )
            .map_err(storage)?;
        Ok(!live)
    }

    fn requeue_failed(&self) -> Result<usize, FrontierError> {
        // Shift failed entries past the current tail, keeping their relative order
        self.conn
            .lock()
            .execute(
                "UPDATE frontier
                 SET state = 'pending', attempts = 0, updated_at = ?1,
                     position = position + (SELECT MAX(position) FROM frontier)
                 WHERE state = 'failed'",
                params![current_timestamp()],
            )
            .map_err(storage)
    }

    fn stats(&self) -> Result<FrontierStats, FrontierError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT state, COUNT(*) FROM frontier GROUP BY state")
            .map_err(storage)?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;

        let mut stats = FrontierStats::default();
        for (state, count) in rows {
            stats.add(EntryState::parse(&state)?, count as u64);
        }
        Ok(stats)
    }
}
