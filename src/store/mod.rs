//! Deduplicating game store with dual persistence.
//!
//! Accepted records are written twice: first to the append-only JSONL
//! journal, then to the SQLite index. The journal is the source of record;
//! the index serves dedup checks and ordered reads. On open the two sides
//! are reconciled in both directions so a crash between the writes, or a
//! hand-edited journal, converges back to one consistent set.

mod journal;
mod schema;
mod sqlite;

pub use journal::Journal;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteIndex;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::record::GameRecord;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid timestamp in index: {0}")]
    Timestamp(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What happened to a submitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New URL; the record was journaled and indexed
    Accepted,
    /// The normalized URL was already present; nothing was written
    DuplicateSkipped,
}

/// Repairs applied during startup reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Journal records that were missing from the index
    pub indexed_from_journal: usize,
    /// Index records that were missing from the journal
    pub journaled_from_index: usize,
}

struct StoreInner {
    index: SqliteIndex,
    journal: Journal,
}

/// The deduplicating store. A single lock serializes all writers; clones of
/// the surrounding `Arc` are what sessions share.
pub struct GameStore {
    inner: Mutex<StoreInner>,
}

impl GameStore {
    /// Opens both sides of the store and reconciles them.
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        Self::open_at(
            Path::new(&config.database_path),
            Path::new(&config.journal_path),
        )
    }

    pub fn open_at(database_path: &Path, journal_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            inner: Mutex::new(StoreInner {
                index: SqliteIndex::open(database_path)?,
                journal: Journal::open(journal_path)?,
            }),
        };

        let report = store.reconcile()?;
        if report.indexed_from_journal > 0 || report.journaled_from_index > 0 {
            info!(
                indexed_from_journal = report.indexed_from_journal,
                journaled_from_index = report.journaled_from_index,
                "store reconciled"
            );
        }
        Ok(store)
    }

    /// Submits a record. Duplicates by normalized URL are skipped without
    /// touching either side.
    ///
    /// The journal line lands before the index row. If the index write then
    /// fails, the sides diverge by that one record until the next open,
    /// where [`reconcile`](Self::reconcile) indexes it from the journal.
    pub fn submit(&self, record: &GameRecord) -> StoreResult<SubmitOutcome> {
        let inner = self.lock();
        if inner.index.contains(&record.source_url)? {
            return Ok(SubmitOutcome::DuplicateSkipped);
        }

        // Journal first; a crash after this point is repaired on next open
        inner.journal.append(record)?;
        if inner.index.insert(record)? {
            Ok(SubmitOutcome::Accepted)
        } else {
            warn!(url = %record.source_url, "index rejected a record the contains check passed");
            Ok(SubmitOutcome::DuplicateSkipped)
        }
    }

    pub fn contains(&self, url: &str) -> StoreResult<bool> {
        self.lock().index.contains(url)
    }

    /// Records at or after `since`, oldest first.
    pub fn records(&self, since: Option<DateTime<Utc>>) -> StoreResult<Vec<GameRecord>> {
        self.lock().index.records_since(since)
    }

    pub fn load_checkpoint(&self, platform: &str) -> StoreResult<Option<u32>> {
        self.lock().index.load_checkpoint(platform)
    }

    pub fn save_checkpoint(&self, platform: &str, next_page: u32) -> StoreResult<()> {
        self.lock().index.save_checkpoint(platform, next_page)
    }

    pub fn record_visited(&self, platform: &str, url: &str) -> StoreResult<()> {
        self.lock().index.record_visited(platform, url)
    }

    pub fn load_visited(&self, platform: &str) -> StoreResult<HashSet<String>> {
        self.lock().index.load_visited(platform)
    }

    /// Drops all resume state (checkpoints and visited marks). Accepted
    /// records are never touched.
    pub fn clear_session_state(&self) -> StoreResult<()> {
        self.lock().index.clear_session_state()
    }

    /// Converges journal and index onto the union of their records.
    pub fn reconcile(&self) -> StoreResult<ReconcileReport> {
        let inner = self.lock();
        let mut report = ReconcileReport::default();

        let journal_records = inner.journal.read_all()?;
        let indexed_urls = inner.index.all_urls()?;

        let mut journal_urls = HashSet::new();
        for record in &journal_records {
            journal_urls.insert(record.source_url.clone());
            if !indexed_urls.contains(&record.source_url) && inner.index.insert(record)? {
                report.indexed_from_journal += 1;
            }
        }

        for record in inner.index.records_since(None)? {
            if !journal_urls.contains(&record.source_url) {
                inner.journal.append(&record)?;
                report.journaled_from_index += 1;
            }
        }

        Ok(report)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
