//! Read-side views of the store: summary statistics and JSON export.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::store::GameStore;
use crate::Result;

/// Summary of everything in the store.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub total: usize,
    /// Records carrying an embed or iframe address
    pub with_playable: usize,
    pub without_playable: usize,
    pub per_platform: BTreeMap<String, usize>,
    pub last_scraped: Option<DateTime<Utc>>,
}

/// Computes statistics over the whole store.
pub fn load_statistics(store: &GameStore) -> Result<Statistics> {
    let mut stats = Statistics::default();
    for record in store.records(None)? {
        stats.total += 1;
        if record.has_playable_url() {
            stats.with_playable += 1;
        } else {
            stats.without_playable += 1;
        }
        *stats.per_platform.entry(record.platform.clone()).or_insert(0) += 1;
        stats.last_scraped = match stats.last_scraped {
            Some(last) if last >= record.scraped_at => Some(last),
            _ => Some(record.scraped_at),
        };
    }
    Ok(stats)
}

impl Statistics {
    /// Human-readable rendering for the CLI.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("total games:      {}\n", self.total));
        out.push_str(&format!("with playable:    {}\n", self.with_playable));
        out.push_str(&format!("without playable: {}\n", self.without_playable));
        for (platform, count) in &self.per_platform {
            out.push_str(&format!("  {:<16} {}\n", platform, count));
        }
        match self.last_scraped {
            Some(at) => out.push_str(&format!("last scraped:     {}\n", at.to_rfc3339())),
            None => out.push_str("last scraped:     never\n"),
        }
        out
    }
}

/// Writes records at or after `since` to `path` as a JSON array, oldest
/// first. Returns how many were written.
pub fn export_records(
    store: &GameStore,
    since: Option<DateTime<Utc>>,
    path: &Path,
) -> Result<usize> {
    let records = store.records(since)?;

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records)
        .map_err(crate::store::StoreError::from)?;
    writer.flush()?;

    info!(path = %path.display(), count = records.len(), "records exported");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::record::GameRecord;
    use tempfile::tempdir;

    fn store_with(records: &[GameRecord]) -> (GameStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store =
            GameStore::open_at(&dir.path().join("games.db"), &dir.path().join("games.jsonl"))
                .unwrap();
        for record in records {
            store.submit(record).unwrap();
        }
        (store, dir)
    }

    fn playable(url: &str) -> GameRecord {
        GameRecord::new(
            "Tower Climb".to_string(),
            url.to_string(),
            String::new(),
            "https://html-classic.itch.zone/html/1/t/index.html".to_string(),
            Platform::Itch,
        )
    }

    fn bare(url: &str) -> GameRecord {
        GameRecord::new(
            "Cave Runner".to_string(),
            url.to_string(),
            String::new(),
            String::new(),
            Platform::AzGames,
        )
    }

    #[test]
    fn test_statistics_counts() {
        let (store, _dir) = store_with(&[
            playable("https://alice.itch.io/tower"),
            bare("https://azgames.io/cave-runner"),
        ]);
        let stats = load_statistics(&store).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_playable, 1);
        assert_eq!(stats.without_playable, 1);
        assert_eq!(stats.per_platform.get("itch.io"), Some(&1));
        assert_eq!(stats.per_platform.get("azgames.io"), Some(&1));
        assert!(stats.last_scraped.is_some());
    }

    #[test]
    fn test_empty_store_statistics() {
        let (store, _dir) = store_with(&[]);
        let stats = load_statistics(&store).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.last_scraped, None);
        assert!(stats.render().contains("never"));
    }

    #[test]
    fn test_export_writes_json_array() {
        let (store, _dir) = store_with(&[playable("https://alice.itch.io/tower")]);
        let dir = tempdir().unwrap();
        let out = dir.path().join("export.json");

        let count = export_records(&store, None, &out).unwrap();
        assert_eq!(count, 1);

        let text = std::fs::read_to_string(&out).unwrap();
        let parsed: Vec<GameRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0].source_url, "https://alice.itch.io/tower");
    }
}
