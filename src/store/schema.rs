//! Database schema for the game index.

use rusqlite::Connection;

/// SQL schema for the index database
pub const SCHEMA_SQL: &str = r#"
-- Accepted game records, unique by normalized source URL
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    embed_url TEXT NOT NULL DEFAULT '',
    iframe_url TEXT NOT NULL DEFAULT '',
    platform TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_games_platform ON games(platform);
CREATE INDEX IF NOT EXISTS idx_games_scraped_at ON games(scraped_at);

-- Listing cursor per platform, for resuming an interrupted session
CREATE TABLE IF NOT EXISTS checkpoints (
    platform TEXT PRIMARY KEY,
    next_page INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

-- Detail pages already processed, so a resumed session skips them
CREATE TABLE IF NOT EXISTS visited (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,
    url TEXT NOT NULL,
    UNIQUE(platform, url)
);

CREATE INDEX IF NOT EXISTS idx_visited_platform ON visited(platform);
"#;

/// Initializes the database schema.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
