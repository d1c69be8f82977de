//! SQLite index backend.
//!
//! The index answers the dedup question and serves ordered reads; the
//! journal next door is the append-only source of record. Everything here
//! is synchronous rusqlite behind the store's lock.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::record::GameRecord;
use crate::store::schema::initialize_schema;
use crate::store::{StoreError, StoreResult};

/// SQLite-backed game index.
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory index for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts a record; returns false when the URL is already indexed.
    pub fn insert(&self, record: &GameRecord) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO games (name, url, embed_url, iframe_url, platform, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.name,
                record.source_url,
                record.embed_url,
                record.iframe_url,
                record.platform,
                record.scraped_at.to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn contains(&self, url: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM games WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    pub fn all_urls(&self) -> StoreResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM games")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    /// All records at or after `since`, oldest first. `None` returns the
    /// whole index.
    pub fn records_since(&self, since: Option<DateTime<Utc>>) -> StoreResult<Vec<GameRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, url, embed_url, iframe_url, platform, scraped_at
             FROM games
             WHERE scraped_at >= ?1
             ORDER BY scraped_at ASC, id ASC",
        )?;
        let floor = since
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| String::from(""));
        let rows = stmt.query_map(params![floor], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parse_record(row?)?);
        }
        Ok(records)
    }

    pub fn load_checkpoint(&self, platform: &str) -> StoreResult<Option<u32>> {
        let page: Option<u32> = self
            .conn
            .query_row(
                "SELECT next_page FROM checkpoints WHERE platform = ?1",
                params![platform],
                |row| row.get(0),
            )
            .optional()?;
        Ok(page)
    }

    pub fn save_checkpoint(&self, platform: &str, next_page: u32) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO checkpoints (platform, next_page, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(platform) DO UPDATE SET next_page = ?2, updated_at = ?3",
            params![platform, next_page, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn record_visited(&self, platform: &str, url: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO visited (platform, url) VALUES (?1, ?2)",
            params![platform, url],
        )?;
        Ok(())
    }

    pub fn load_visited(&self, platform: &str) -> StoreResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM visited WHERE platform = ?1")?;
        let urls = stmt
            .query_map(params![platform], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    /// Drops checkpoints and visited marks; accepted records stay.
    pub fn clear_session_state(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM checkpoints", [])?;
        self.conn.execute("DELETE FROM visited", [])?;
        Ok(())
    }
}

type RawRow = (String, String, String, String, String, String);

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<RawRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn parse_record(raw: RawRow) -> StoreResult<GameRecord> {
    let (name, source_url, embed_url, iframe_url, platform, scraped_at) = raw;
    let scraped_at = DateTime::parse_from_rfc3339(&scraped_at)
        .map_err(|e| StoreError::Timestamp(format!("{}: {}", scraped_at, e)))?
        .with_timezone(&Utc);
    Ok(GameRecord {
        name,
        source_url,
        embed_url,
        iframe_url,
        platform,
        scraped_at,
    })
}
