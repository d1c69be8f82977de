//! Configuration module for Game-Quarry
//!
//! Handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use game_quarry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("quarry.toml")).unwrap();
//! println!("Detail workers: {}", config.session.detail_workers);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, FetchConfig, SessionConfig, StorageConfig};
