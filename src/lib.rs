//! Game-Quarry: a game-listing harvester
//!
//! This crate collects structured game-listing records (name, page URL,
//! embeddable iframe address) from several third-party gaming sites,
//! deduplicates them against previously collected data, and persists them
//! to a dual store (append-only journal + queryable SQLite index).

pub mod config;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod platform;
pub mod record;
pub mod session;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Game-Quarry operations
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("All fetch attempts exhausted for {url}")]
    FetchExhausted { url: String },

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Game-Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use platform::{Platform, PlatformSpec};
pub use record::GameRecord;
pub use store::{GameStore, SubmitOutcome};
pub use url::{normalize_url, resolve_and_normalize};
