use crate::config::types::Config;
use crate::platform::Platform;
use crate::ConfigError;

/// Validates a parsed configuration.
///
/// Checks that limits are usable (non-zero pools, coherent jitter bounds),
/// that store paths are non-empty, and that every named platform is
/// registered.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.fetch.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "fetch.max-attempts must be at least 1".to_string(),
        ));
    }

    if config.fetch.browser_pool_size == 0 {
        return Err(ConfigError::Validation(
            "fetch.browser-pool-size must be at least 1".to_string(),
        ));
    }

    if config.fetch.jitter_min_ms > config.fetch.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "fetch.jitter-min-ms ({}) exceeds fetch.jitter-max-ms ({})",
            config.fetch.jitter_min_ms, config.fetch.jitter_max_ms
        )));
    }

    if config.session.detail_workers == 0 {
        return Err(ConfigError::Validation(
            "session.detail-workers must be at least 1".to_string(),
        ));
    }

    if config.session.max_list_pages == 0 {
        return Err(ConfigError::Validation(
            "session.max-list-pages must be at least 1".to_string(),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.database-path must not be empty".to_string(),
        ));
    }

    if config.storage.journal_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.journal-path must not be empty".to_string(),
        ));
    }

    for id in &config.session.platforms {
        if Platform::parse(id).is_none() {
            return Err(ConfigError::Validation(format!(
                "unknown platform in session.platforms: {}",
                id
            )));
        }
    }

    Ok(())
}
