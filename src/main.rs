//! Game-Quarry main entry point
//!
//! This is the command-line interface for the Game-Quarry listing harvester.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use game_quarry::config::load_config_with_hash;
use game_quarry::export::{export_records, load_statistics};
use game_quarry::fetch::{build_http_client, BrowserPool, BrowserTransport, FetchOrchestrator, HttpTransport};
use game_quarry::platform::Platform;
use game_quarry::session::{CancelToken, CrawlSession, SessionState};
use game_quarry::store::GameStore;
use tracing_subscriber::EnvFilter;

/// Game-Quarry: a browser-game listing harvester
///
/// Game-Quarry walks the new-release listings of embedded-game platforms,
/// escalating from plain HTTP to a headless browser only when a page needs
/// it, and collects deduplicated game records with their playable embed
/// addresses.
#[derive(Parser, Debug)]
#[command(name = "game-quarry")]
#[command(version = "1.0.0")]
#[command(about = "A browser-game listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Harvest only these platforms (repeatable); default is the config list
    #[arg(short, long, value_name = "ID")]
    platform: Vec<String>,

    /// Override the per-session item limit
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Discard checkpoints and visited marks before starting
    #[arg(long)]
    fresh: bool,

    /// Show store statistics and exit
    #[arg(long, conflicts_with = "export")]
    stats: bool,

    /// Export records as JSON to the given path and exit
    #[arg(long, value_name = "PATH", conflicts_with = "stats")]
    export: Option<PathBuf>,

    /// With --export: only records scraped in the last N hours
    #[arg(long, value_name = "HOURS", requires = "export")]
    since_hours: Option<i64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(max_items) = cli.max_items {
        config.session.max_items = max_items;
    }
    if !cli.platform.is_empty() {
        config.session.platforms = cli.platform.clone();
    }

    if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = &cli.export {
        handle_export(&config, path, cli.since_hours)?;
    } else {
        handle_harvest(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("game_quarry=info,warn"),
            1 => EnvFilter::new("game_quarry=debug,info"),
            2 => EnvFilter::new("game_quarry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows store statistics
fn handle_stats(config: &game_quarry::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let store = GameStore::open(&config.storage)?;
    let stats = load_statistics(&store)?;
    print!("{}", stats.render());

    Ok(())
}

/// Handles the --export mode: writes records to a JSON file
fn handle_export(
    config: &game_quarry::Config,
    path: &PathBuf,
    since_hours: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = GameStore::open(&config.storage)?;
    let since = since_hours.map(|hours| chrono::Utc::now() - chrono::Duration::hours(hours));

    let count = export_records(&store, since, path)?;
    println!("✓ Exported {} records to: {}", count, path.display());

    Ok(())
}

/// Resolves the platforms a harvest should cover.
fn selected_platforms(config: &game_quarry::Config) -> Result<Vec<Platform>, Box<dyn std::error::Error>> {
    if config.session.platforms.is_empty() {
        return Ok(Platform::ALL.to_vec());
    }
    let mut platforms = Vec::new();
    for id in &config.session.platforms {
        let platform = Platform::parse(id)
            .ok_or_else(|| game_quarry::QuarryError::UnknownPlatform(id.clone()))?;
        platforms.push(platform);
    }
    Ok(platforms)
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: game_quarry::Config,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let platforms = selected_platforms(&config)?;
    tracing::info!(
        "Harvesting {} platform(s): {}",
        platforms.len(),
        platforms
            .iter()
            .map(|p| p.id())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let store = Arc::new(GameStore::open(&config.storage)?);
    if fresh {
        tracing::info!("Fresh start requested, clearing checkpoints and visited marks");
        store.clear_session_state()?;
    }

    let light = Arc::new(HttpTransport::new(build_http_client()?));
    let pool = Arc::new(BrowserPool::new(config.fetch.browser_pool_size));
    let browser = Arc::new(BrowserTransport::new(
        pool,
        Duration::from_millis(config.fetch.settle_ms),
    ));
    let orchestrator = Arc::new(FetchOrchestrator::new(light, browser, config.fetch.clone()));

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight work");
                cancel.cancel();
            }
        });
    }

    let mut sessions = tokio::task::JoinSet::new();
    let mut monitors = Vec::new();
    for platform in platforms {
        let session = CrawlSession::new(
            platform,
            Arc::clone(&orchestrator),
            Arc::clone(&store),
            config.session.clone(),
            cancel.clone(),
        );
        monitors.push((platform, session.progress()));
        sessions.spawn(session.run());
    }

    // Periodic progress line while sessions run
    let monitor = tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(15));
        tick.tick().await;
        loop {
            tick.tick().await;
            for (platform, progress) in &monitors {
                let snap = progress.snapshot();
                tracing::info!(
                    "{}: {} (accepted {}, duplicates {}, failed {})",
                    platform.id(),
                    snap.state,
                    snap.counts.accepted,
                    snap.counts.duplicates,
                    snap.counts.failed,
                );
            }
        }
    });

    let mut any_failed = false;
    while let Some(joined) = sessions.join_next().await {
        let report = joined??;
        println!(
            "{:<16} {:<10} accepted {:>4}  duplicates {:>4}  failed {:>4}  pages {:>3}",
            report.platform.id(),
            report.state.to_string(),
            report.counts.accepted,
            report.counts.duplicates,
            report.counts.failed,
            report.pages_walked,
        );
        if report.state == SessionState::Failed {
            any_failed = true;
            if let Some(reason) = &report.failure {
                tracing::error!("{}: {}", report.platform.id(), reason);
            }
        }
    }

    monitor.abort();
    tracing::info!(
        "Harvest done ({} browser escalations)",
        orchestrator.escalations()
    );

    if any_failed {
        return Err("one or more sessions failed".into());
    }
    Ok(())
}
