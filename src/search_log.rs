//! Append-only SQLite log of search requests.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS search_logs (
    id            TEXT PRIMARY KEY,
    timestamp     TEXT NOT NULL,      -- RFC 3339, UTC, fixed-width
    client_ip     TEXT NOT NULL,
    user_agent    TEXT NOT NULL,
    query         TEXT NOT NULL,
    country       TEXT NOT NULL,      -- requested search locale (gl)
    ip_country    TEXT,               -- derived from client_ip
    result_count  INTEGER NOT NULL DEFAULT 0,
    total_results INTEGER,
    search_time   REAL,
    status        INTEGER NOT NULL,   -- HTTP status returned to the client
    error         TEXT
);

CREATE INDEX IF NOT EXISTS idx_search_logs_timestamp ON search_logs(timestamp);
"#;

#[derive(Debug, thiserror::Error)]
pub enum SearchLogError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search log lock poisoned")]
    Poisoned,
}

/// One row of the search log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogRecord {
    pub id: String,
    pub timestamp: String,
    pub client_ip: String,
    pub user_agent: String,
    pub query: String,
    pub country: String,
    pub ip_country: Option<String>,
    pub result_count: i64,
    pub total_results: Option<i64>,
    pub search_time: Option<f64>,
    pub status: u16,
    pub error: Option<String>,
}

impl SearchLogRecord {
    /// New record stamped with a fresh id and the current UTC time.
    pub fn new(
        client_ip: impl Into<String>,
        user_agent: impl Into<String>,
        query: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
            query: query.into(),
            country: country.into(),
            ip_country: None,
            result_count: 0,
            total_results: None,
            search_time: None,
            status: 200,
            error: None,
        }
    }
}

pub struct SearchLog {
    conn: Mutex<Connection>,
}

impl SearchLog {
    /// Open (or create) the log database at `path`.
    pub fn open(path: &Path) -> Result<Self, SearchLogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, SearchLogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SearchLogError> {
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn append(&self, record: &SearchLogRecord) -> Result<(), SearchLogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO search_logs \
             (id, timestamp, client_ip, user_agent, query, country, ip_country, \
              result_count, total_results, search_time, status, error) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                record.timestamp,
                record.client_ip,
                record.user_agent,
                record.query,
                record.country,
                record.ip_country,
                record.result_count,
                record.total_results,
                record.search_time,
                record.status,
                record.error,
            ],
        )?;
        Ok(())
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SearchLogRecord>, SearchLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, client_ip, user_agent, query, country, ip_country, \
             result_count, total_results, search_time, status, error \
             FROM search_logs ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], row_to_record)?;

        let mut records = Vec::new();
        for r in rows {
            records.push(r?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<u64, SearchLogError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM search_logs", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn schema_version(&self) -> Result<Option<u32>, SearchLogError> {
        let conn = self.lock()?;
        Ok(read_schema_version(&conn)?)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SearchLogError> {
        self.conn.lock().map_err(|_| SearchLogError::Poisoned)
    }
}

fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchLogRecord> {
    Ok(SearchLogRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        client_ip: row.get(2)?,
        user_agent: row.get(3)?,
        query: row.get(4)?,
        country: row.get(5)?,
        ip_country: row.get(6)?,
        result_count: row.get(7)?,
        total_results: row.get(8)?,
        search_time: row.get(9)?,
        status: row.get(10)?,
        error: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str, timestamp: &str) -> SearchLogRecord {
        let mut r = SearchLogRecord::new("203.0.113.7", "curl/8.0", query, "us");
        r.timestamp = timestamp.to_string();
        r
    }

    #[test]
    fn schema_apply_is_idempotent_and_versioned() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("first apply");
        apply_schema(&conn).expect("second apply");
        assert_eq!(
            read_schema_version(&conn).expect("read"),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn append_stores_fields_verbatim() {
        let log = SearchLog::open_in_memory().expect("open");
        let mut r = record("  \"acme corp\" site:example.com ", "2026-01-02T03:04:05.123456+00:00");
        r.ip_country = Some("NL".to_string());
        r.result_count = 9;
        r.total_results = Some(4_560);
        r.search_time = Some(0.31);
        log.append(&r).expect("append");

        let stored = log.recent(10).expect("recent");
        assert_eq!(stored, vec![r]);
    }

    #[test]
    fn failed_search_records_error() {
        let log = SearchLog::open_in_memory().expect("open");
        let mut r = record("q", "2026-01-02T03:04:05+00:00");
        r.status = 429;
        r.error = Some("Rate limit exceeded. Please try again later.".to_string());
        log.append(&r).expect("append");

        let stored = &log.recent(1).expect("recent")[0];
        assert_eq!(stored.status, 429);
        assert_eq!(stored.error.as_deref(), Some("Rate limit exceeded. Please try again later."));
        assert_eq!(stored.ip_country, None);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let log = SearchLog::open_in_memory().expect("open");
        log.append(&record("first", "2026-01-01T00:00:00+00:00")).unwrap();
        log.append(&record("third", "2026-01-03T00:00:00+00:00")).unwrap();
        log.append(&record("second", "2026-01-02T00:00:00+00:00")).unwrap();

        let queries: Vec<String> = log
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|r| r.query)
            .collect();
        assert_eq!(queries, vec!["third", "second"]);
        assert_eq!(log.count().unwrap(), 3);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let log = SearchLog::open_in_memory().expect("open");
        let r = record("dup", "2026-01-01T00:00:00+00:00");
        log.append(&r).unwrap();
        assert!(log.append(&r).is_err());
        assert_eq!(log.count().unwrap(), 1);
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("search_logs.db");
        {
            let log = SearchLog::open(&path).expect("open");
            log.append(&record("persisted", "2026-01-01T00:00:00+00:00")).unwrap();
        }
        let log = SearchLog::open(&path).expect("reopen");
        assert_eq!(log.count().unwrap(), 1);
        assert_eq!(log.recent(1).unwrap()[0].query, "persisted");
        assert_eq!(log.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
