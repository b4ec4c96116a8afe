use crate::frontier::SqliteFrontier;
use crate::links::SqliteLinkStore;
use outlink_scanner::{EntryState, FrontierEntry, LinkRecord};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Shared handle to the SQLite file holding the frontier, the recorded links
/// and the crawl sessions. Cloning is cheap; all clones use one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
    pub seed_urls: String,
    pub configuration: Option<String>,
}

pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Open (or create) the database.
    ///
    /// Opening never touches the frontier; a crawl calls
    /// [`Database::recover_in_flight`] itself before it starts.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            "
            -- Crawl runs
            CREATE TABLE IF NOT EXISTS crawl_sessions (
    id TEXT PRIMARY KEY,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed', 'cancelled')),
    seed_urls TEXT NOT NULL,  -- JSON array
    configuration TEXT        -- JSON configuration used
);

-- Crawl frontier, one row per distinct URL string
CREATE TABLE IF NOT EXISTS frontier (
    url TEXT PRIMARY KEY,
    state TEXT NOT NULL DEFAULT 'pending' CHECK(state IN ('pending', 'in_flight', 'done', 'failed')),
    attempts INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL,    -- FIFO order among pending entries
    discovered_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_frontier_queue ON frontier(state, position);
CREATE INDEX IF NOT EXISTS idx_frontier_position ON frontier(position);

-- Discovered external links
CREATE TABLE IF NOT EXISTS page (
    url TEXT PRIMARY KEY,
    is_home BOOLEAN NOT NULL,
    discovered_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_is_home ON page(is_home);
            ",
        )?;
        Ok(())
    }

    /// Move every in-flight entry back to pending.
    ///
    /// Only valid while no crawl is running against this file: in-flight rows
    /// are then leftovers of an unclean shutdown.
    pub fn recover_in_flight(&self) -> Result<usize> {
        let recovered = self.conn.lock().execute(
            "UPDATE frontier SET state = 'pending', updated_at = ?1 WHERE state = 'in_flight'",
            params![current_timestamp()],
        )?;
        if recovered > 0 {
            info!(
                "Recovered {} in-flight frontier entries from an unclean shutdown",
                recovered
            );
        }
        Ok(recovered)
    }

    pub fn frontier(&self) -> SqliteFrontier {
        SqliteFrontier::new(self.conn.clone())
    }

    pub fn link_store(&self) -> SqliteLinkStore {
        SqliteLinkStore::new(self.conn.clone())
    }

    // Session management
    pub fn create_session(&self, seed_urls: &str, configuration: Option<&str>) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.lock().execute(
            "INSERT INTO crawl_sessions (id, start_time, status, seed_urls, configuration) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&session_id, timestamp, SessionStatus::Running.as_str(), seed_urls, configuration],
        )?;

        Ok(session_id)
    }

    pub fn finish_session(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.lock().execute(
            "UPDATE crawl_sessions SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status.as_str(), timestamp, session_id],
        )?;
        Ok(())
    }

    pub fn complete_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, SessionStatus::Completed)
    }

    pub fn fail_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, SessionStatus::Failed)
    }

    pub fn cancel_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, SessionStatus::Cancelled)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, start_time, end_time, status, seed_urls, configuration
             FROM crawl_sessions WHERE id = ?1",
        )?;
        stmt.query_row(params![session_id], session_from_row)
            .optional()
    }

    pub fn latest_session(&self) -> Result<Option<SessionInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, start_time, end_time, status, seed_urls, configuration
             FROM crawl_sessions ORDER BY start_time DESC, rowid DESC LIMIT 1",
        )?;
        stmt.query_row([], session_from_row).optional()
    }

    // Recorded links
    pub fn get_links(&self) -> Result<Vec<LinkRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT url, is_home FROM page ORDER BY url")?;

        let links = stmt
            .query_map([], |row| {
                Ok(LinkRecord {
                    url: row.get(0)?,
                    is_home: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(links)
    }

    pub fn count_links(&self) -> Result<(i64, i64)> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_home), 0) FROM page",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    // Frontier inspection
    pub fn get_frontier_entries(&self, state: EntryState) -> Result<Vec<FrontierEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT url, attempts FROM frontier WHERE state = ?1 ORDER BY position",
        )?;

        let entries = stmt
            .query_map(params![state.as_str()], |row| {
                Ok(FrontierEntry {
                    url: row.get(0)?,
                    state,
                    attempts: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(entries)
    }
}

fn session_from_row(row: &rusqlite::Row<'_>) -> Result<SessionInfo> {
    Ok(SessionInfo {
        id: row.get(0)?,
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        status: row.get(3)?,
        seed_urls: row.get(4)?,
        configuration: row.get(5)?,
    })
}
