//! Dock-Tally main entry point
//!
//! This is the command-line interface for the Dock-Tally shipment collector.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use dock_tally::config::{load_config_with_hash, Config};
use dock_tally::output::{Notifier, StdoutNotifier, TelegramNotifier};
use dock_tally::Collector;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Dock-Tally: inbound shipment collector
///
/// Dock-Tally logs into every configured pickup-point portal, collects
/// today's inbound shipments, groups them into unloading batches and sends
/// one report per portal.
#[derive(Parser, Debug)]
#[command(name = "dock-tally")]
#[command(version = "1.0.0")]
#[command(about = "Inbound shipment collector for pickup-point portals", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be collected without collecting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Print reports to stdout instead of sending them
    #[arg(long)]
    no_notify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_collect(config, config_hash, cli.no_notify).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dock_tally=info,warn"),
            1 => EnvFilter::new("dock_tally=debug,info"),
            2 => EnvFilter::new("dock_tally=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Dock-Tally Dry Run ===\n");

    println!("Collector Configuration:");
    println!(
        "  Max concurrent sources: {}",
        config.collector.max_concurrent_sources
    );
    println!(
        "  Max concurrent details: {}",
        config.collector.max_concurrent_details
    );
    println!("  Page size: {}", config.collector.page_size);
    println!("  Page delay: {}ms", config.collector.page_delay_ms);
    println!(
        "  Timeouts: {}s requests, {}s login",
        config.collector.request_timeout_secs, config.collector.login_timeout_secs
    );

    println!("\nPortal:");
    println!("  Login path: {}", config.portal.login_path);
    println!("  Listing path: {}", config.portal.listing_path);

    println!("\nUser Agent: {}/{}", config.user_agent.name, config.user_agent.version);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    match &config.notify {
        Some(notify) => println!("  Telegram: {} chats", notify.chat_ids.len()),
        None => println!("  Telegram: not configured, reports go to stdout"),
    }

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let own_login = if source.username.is_some() {
            " (own credentials)"
        } else {
            ""
        };
        println!("  - {} {}{}", source.id, source.base_url, own_login);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use dock_tally::output::{load_statistics, print_statistics};
    use dock_tally::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, Local::now().date_naive())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main collection run
async fn handle_collect(config: Config, config_hash: String, no_notify: bool) -> anyhow::Result<()> {
    let notifier: Box<dyn Notifier> = match (&config.notify, no_notify) {
        (Some(notify), false) => {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.collector.request_timeout_secs))
                .build()?;
            Box::new(TelegramNotifier::new(notify, http))
        }
        _ => Box::new(StdoutNotifier),
    };

    let collector = Collector::from_config(config, config_hash)?;
    let outcomes = collector.run().await;

    let delivered = collector.deliver(&outcomes, notifier.as_ref()).await;
    tracing::info!(
        "Delivered {}/{} messages via {}",
        delivered,
        outcomes.len(),
        notifier.name()
    );

    Ok(())
}
