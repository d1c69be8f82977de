//! Integration tests for the dual-persistence store.

use std::fs::OpenOptions;
use std::io::Write;

use chrono::{Duration, Timelike, Utc};
use tempfile::TempDir;

use game_quarry::export::export_records;
use game_quarry::platform::Platform;
use game_quarry::record::GameRecord;
use game_quarry::store::{GameStore, SqliteIndex, SubmitOutcome};
use game_quarry::url::normalize_url;

fn open_store(dir: &TempDir) -> GameStore {
    GameStore::open_at(&dir.path().join("games.db"), &dir.path().join("games.jsonl")).unwrap()
}

fn record(name: &str, url: &str) -> GameRecord {
    GameRecord::new(
        name.to_string(),
        url.to_string(),
        String::new(),
        "https://html-classic.itch.zone/html/1/g/index.html".to_string(),
        Platform::Itch,
    )
}

#[test]
fn test_submit_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let rec = record("Tower Climb", "https://alice.itch.io/tower");
    assert_eq!(store.submit(&rec).unwrap(), SubmitOutcome::Accepted);
    assert_eq!(store.submit(&rec).unwrap(), SubmitOutcome::DuplicateSkipped);

    assert_eq!(store.records(None).unwrap().len(), 1);
}

#[test]
fn test_normalized_variants_collide() {
    // Both spellings normalize to the same URL, so the second submit is a
    // duplicate
    let a = normalize_url("https://Alice.ITCH.io/tower/").unwrap();
    let b = normalize_url("https://alice.itch.io/tower#comments").unwrap();
    assert_eq!(a, b);

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert_eq!(
        store.submit(&record("Tower Climb", a.as_str())).unwrap(),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        store.submit(&record("Tower Climb", b.as_str())).unwrap(),
        SubmitOutcome::DuplicateSkipped
    );
}

#[test]
fn test_reconcile_indexes_journal_only_records() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store
            .submit(&record("Tower Climb", "https://alice.itch.io/tower"))
            .unwrap();
    }

    // A record that reached the journal but never the index, as after a
    // crash between the two writes
    let orphan = record("Cave Runner", "https://bob.itch.io/cave");
    let mut journal = OpenOptions::new()
        .append(true)
        .open(dir.path().join("games.jsonl"))
        .unwrap();
    writeln!(journal, "{}", serde_json::to_string(&orphan).unwrap()).unwrap();
    drop(journal);

    let store = open_store(&dir);
    assert!(store.contains("https://bob.itch.io/cave").unwrap());
    assert_eq!(store.records(None).unwrap().len(), 2);
}

#[test]
fn test_reconcile_journals_index_only_records() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("games.db");
    let journal_path = dir.path().join("games.jsonl");

    // Seed the index directly, bypassing the journal
    {
        let index = SqliteIndex::open(&db_path).unwrap();
        index
            .insert(&record("Tower Climb", "https://alice.itch.io/tower"))
            .unwrap();
    }

    let store = GameStore::open_at(&db_path, &journal_path).unwrap();
    drop(store);

    let journal_text = std::fs::read_to_string(&journal_path).unwrap();
    assert!(journal_text.contains("https://alice.itch.io/tower"));
}

#[test]
fn test_reconciled_store_converges() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store
            .submit(&record("Tower Climb", "https://alice.itch.io/tower"))
            .unwrap();
    }

    // Reopening repeatedly must not duplicate anything on either side
    for _ in 0..3 {
        let store = open_store(&dir);
        assert_eq!(store.records(None).unwrap().len(), 1);
    }
    let journal_text = std::fs::read_to_string(dir.path().join("games.jsonl")).unwrap();
    assert_eq!(journal_text.lines().count(), 1);
}

#[test]
fn test_export_window_is_inclusive_and_ordered() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let now = Utc::now().with_nanosecond(0).unwrap();
    let mut old = record("Old", "https://a.itch.io/old");
    old.scraped_at = now - Duration::hours(48);
    let mut mid = record("Mid", "https://a.itch.io/mid");
    mid.scraped_at = now - Duration::hours(12);
    let mut new = record("New", "https://a.itch.io/new");
    new.scraped_at = now - Duration::hours(1);

    // Insert newest first to prove ordering comes from timestamps
    store.submit(&new).unwrap();
    store.submit(&old).unwrap();
    store.submit(&mid).unwrap();

    let out = dir.path().join("export.json");
    let count = export_records(&store, Some(now - Duration::hours(24)), &out).unwrap();
    assert_eq!(count, 2);

    let exported: Vec<GameRecord> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported[0].name, "Mid");
    assert_eq!(exported[1].name, "New");
}

#[test]
fn test_clear_session_state_preserves_records() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store
        .submit(&record("Tower Climb", "https://alice.itch.io/tower"))
        .unwrap();
    store.save_checkpoint("itch.io", 3).unwrap();
    store
        .record_visited("itch.io", "https://alice.itch.io/tower")
        .unwrap();

    store.clear_session_state().unwrap();

    assert_eq!(store.load_checkpoint("itch.io").unwrap(), None);
    assert!(store.load_visited("itch.io").unwrap().is_empty());
    assert!(store.contains("https://alice.itch.io/tower").unwrap());
}
