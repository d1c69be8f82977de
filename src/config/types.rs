use serde::Deserialize;

/// Main configuration structure for Game-Quarry
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Fetch and escalation behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Bodies shorter than this are treated as insufficient and escalate
    /// to the browser transport
    #[serde(rename = "min-body-length", default = "default_min_body_length")]
    pub min_body_length: usize,

    /// Full light-then-browser attempts per page before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff between attempts (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Settle period after browser navigation before the body is read
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Maximum number of concurrently live headless browser instances
    #[serde(rename = "browser-pool-size", default = "default_browser_pool_size")]
    pub browser_pool_size: usize,

    /// Minimum delay between any two requests to the same platform
    #[serde(
        rename = "min-request-interval-ms",
        default = "default_min_request_interval_ms"
    )]
    pub min_request_interval_ms: u64,

    /// Lower bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "jitter-min-ms", default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "jitter-max-ms", default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

/// Per-session crawl limits
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Maximum records to accept per platform session (0 = unbounded)
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// Maximum list pages to walk per session
    #[serde(rename = "max-list-pages", default = "default_max_list_pages")]
    pub max_list_pages: u32,

    /// Size of the detail-page worker pool
    #[serde(rename = "detail-workers", default = "default_detail_workers")]
    pub detail_workers: usize,

    /// Platform identifiers to harvest; empty means all registered
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Persisted store locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite index database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the append-only JSONL journal
    #[serde(rename = "journal-path", default = "default_journal_path")]
    pub journal_path: String,
}

fn default_min_body_length() -> usize {
    2048
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    3000
}
fn default_browser_pool_size() -> usize {
    2
}
fn default_min_request_interval_ms() -> u64 {
    1500
}
fn default_jitter_min_ms() -> u64 {
    200
}
fn default_jitter_max_ms() -> u64 {
    900
}
fn default_max_items() -> usize {
    50
}
fn default_max_list_pages() -> u32 {
    5
}
fn default_detail_workers() -> usize {
    4
}
fn default_database_path() -> String {
    "data/games.db".to_string()
}
fn default_journal_path() -> String {
    "data/games.jsonl".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_body_length: default_min_body_length(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            settle_ms: default_settle_ms(),
            browser_pool_size: default_browser_pool_size(),
            min_request_interval_ms: default_min_request_interval_ms(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_list_pages: default_max_list_pages(),
            detail_workers: default_detail_workers(),
            platforms: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            journal_path: default_journal_path(),
        }
    }
}
