//! Append-only JSONL journal.
//!
//! One record per line. The journal is the durable source of record: every
//! accepted game lands here before the index sees it, so a crash between
//! the two writes loses nothing that reconciliation cannot restore.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::record::GameRecord;
use crate::store::StoreResult;

pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Touch the file so a fresh install reconciles against an empty
        // journal instead of a missing one
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Appends one record and flushes before returning.
    pub fn append(&self, record: &GameRecord) -> StoreResult<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    /// Reads every parseable record. Corrupt lines are skipped with a
    /// warning; a torn final line from a crash must not poison the rest.
    pub fn read_all(&self) -> StoreResult<Vec<GameRecord>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GameRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping unparseable journal line"
                    );
                }
            }
        }
        Ok(records)
    }
}
