//! The canonical record type produced by the pipeline.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// A single harvested game listing.
///
/// `source_url` is always stored in normalized form and is the identity key
/// across the persisted stores. A record is immutable once accepted;
/// re-scraping the same URL is a duplicate, never an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Display name of the game (non-empty)
    pub name: String,

    /// Normalized canonical page URL (unique across the store)
    pub source_url: String,

    /// Embeddable address, e.g. `https://azgames.io/<slug>.embed`
    #[serde(default)]
    pub embed_url: String,

    /// Direct iframe address, e.g. an `html-classic.itch.zone` URL
    #[serde(default)]
    pub iframe_url: String,

    /// Stable platform identifier (see [`Platform::id`])
    pub platform: String,

    /// Time of successful extraction, UTC, second precision
    pub scraped_at: DateTime<Utc>,
}

impl GameRecord {
    /// Builds a record stamped with the current time, truncated to seconds.
    pub fn new(
        name: impl Into<String>,
        source_url: impl Into<String>,
        embed_url: impl Into<String>,
        iframe_url: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let now = Utc::now();
        let scraped_at = now
            .with_nanosecond(0)
            .unwrap_or(now);
        Self {
            name: name.into(),
            source_url: source_url.into(),
            embed_url: embed_url.into(),
            iframe_url: iframe_url.into(),
            platform: platform.id().to_string(),
            scraped_at,
        }
    }

    /// True when the record carries at least one playable address.
    pub fn has_playable_url(&self) -> bool {
        !self.embed_url.trim().is_empty() || !self.iframe_url.trim().is_empty()
    }
}
