use crate::models::QueryRecord;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Database connection wrapper for the query log
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Database { conn })
    }

    /// Initialize the database schema
    pub fn init_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
-- Prediction query log
CREATE TABLE IF NOT EXISTS queries (
    id TEXT PRIMARY KEY,
    website TEXT NOT NULL,
    result TEXT NOT NULL,
    label INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queries_created_at ON queries(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_queries_result ON queries(result);
"#,
        )?;
        Ok(())
    }

    pub fn insert_query(&mut self, record: &QueryRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO queries (id, website, result, label, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.website,
                record.result,
                record.label,
                record.created_at
            ],
        )?;
        Ok(())
    }

    pub fn recent_queries(&self, limit: usize) -> Result<Vec<QueryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, website, result, label, created_at
             FROM queries ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_query)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn query_count(&self) -> Result<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM queries", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_by_result(&self, result: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM queries WHERE result = ?1",
            params![result],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete log entries older than the retention window. Returns rows removed.
    pub fn purge_older_than(&mut self, days: i64) -> Result<usize> {
        let cutoff = chrono::Utc::now().timestamp() - days * 24 * 60 * 60;
        let removed = self.conn.execute(
            "DELETE FROM queries WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    fn row_to_query(row: &Row) -> rusqlite::Result<QueryRecord> {
        Ok(QueryRecord {
            id: row.get(0)?,
            website: row.get(1)?,
            result: row.get(2)?,
            label: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
