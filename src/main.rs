//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest film diary harvester.

use clap::Parser;
use reel_harvest::config::{load_config_with_hash, Config};
use reel_harvest::crawler::{Coordinator, PopularUserDiscovery};
use reel_harvest::output::{
    print_statistics, read_usernames, write_usernames, CrawlStatistics, CsvSink, ResultSink,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reel-Harvest: A polite film diary harvester
///
/// Reel-Harvest crawls members' film listings in small batches, backing off
/// whenever the site rate-limits it, writes one CSV per member and merges
/// them into a single username-tagged dataset.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite film diary harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// CSV file with a `user` column listing members to harvest
    #[arg(long, value_name = "FILE", conflicts_with = "discover")]
    users: Option<PathBuf>,

    /// Collect members from the popular-members directory before crawling
    #[arg(long)]
    discover: bool,

    /// Override the configured number of users per batch
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    batch_size: Option<u32>,

    /// Merge existing per-user files without crawling
    #[arg(long, conflicts_with_all = ["dry_run", "discover", "users"])]
    merge_only: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

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
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(batch_size) = cli.batch_size {
        config.schedule.batch_size = batch_size as usize;
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.users.as_deref())?;
    } else if cli.merge_only {
        handle_merge(&config)?;
    } else {
        let usernames = resolve_usernames(&config, cli.users.as_deref(), cli.discover).await?;
        handle_harvest(&config, &usernames).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
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

/// Picks the member list: explicit file, fresh discovery, or the configured users file
async fn resolve_usernames(
    config: &Config,
    users: Option<&Path>,
    discover: bool,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if discover {
        let discovery = PopularUserDiscovery::from_config(config)?;
        let usernames = discovery.discover(config.discovery.target_users).await?;

        let path = Path::new(&config.discovery.users_path);
        write_usernames(path, &usernames)?;
        tracing::info!("Saved {} usernames to {}", usernames.len(), path.display());
        return Ok(usernames);
    }

    let path = users.unwrap_or_else(|| Path::new(&config.discovery.users_path));
    let usernames = read_usernames(path)?;
    tracing::info!("Loaded {} usernames from {}", usernames.len(), path.display());
    Ok(usernames)
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, users: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Reel-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Origin: {}", config.site.origin);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nFetch:");
    println!("  Max attempts: {}", config.fetch.max_retries);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Backoff: {}ms x [{}, {}) x 2^attempt",
        config.fetch.backoff_base_ms,
        config.fetch.backoff_jitter_min,
        config.fetch.backoff_jitter_max
    );
    println!(
        "  Retry network errors: {}, server errors: {}",
        config.fetch.retry_network_errors, config.fetch.retry_server_errors
    );

    println!("\nSchedule:");
    println!("  Batch size: {}", config.schedule.batch_size);
    println!("  Cooldown: {}ms", config.schedule.cooldown_ms);
    println!(
        "  Courtesy delay: {}-{}ms",
        config.schedule.courtesy_delay_min_ms, config.schedule.courtesy_delay_max_ms
    );
    println!(
        "  Max concurrent pages: {}",
        config.schedule.max_concurrent_pages
    );

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Combined: {}", config.output.aggregate_path);
    println!("  Skipped users: {}", config.output.skipped_path);

    println!("\n✓ Configuration is valid");

    let path = users.unwrap_or_else(|| Path::new(&config.discovery.users_path));
    match read_usernames(path) {
        Ok(usernames) => {
            let batches = usernames.len().div_ceil(config.schedule.batch_size.max(1));
            println!(
                "✓ Would harvest {} users from {} in {} batches",
                usernames.len(),
                path.display(),
                batches
            );
        }
        Err(e) => println!("✗ Could not read users from {}: {}", path.display(), e),
    }

    Ok(())
}

/// Handles the --merge-only mode: rebuilds the combined dataset from disk
fn handle_merge(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let sink = CsvSink::from_config(&config.output)?;
    let aggregate = sink.merge_all()?;

    println!(
        "✓ Combined {} rows from {} users into {}",
        aggregate.len(),
        aggregate.users().len(),
        config.output.aggregate_path
    );
    if !aggregate.skipped.is_empty() {
        println!(
            "  {} empty datasets listed in {}",
            aggregate.skipped.len(),
            config.output.skipped_path
        );
    }
    if !aggregate.unreadable.is_empty() {
        println!(
            "✗ Could not read datasets for: {}",
            aggregate.unreadable.join(", ")
        );
    }

    Ok(())
}

/// Handles the main harvest: crawl, merge, report
async fn handle_harvest(
    config: &Config,
    usernames: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    if usernames.is_empty() {
        tracing::warn!("No usernames to harvest");
        return Ok(());
    }

    let coordinator = Coordinator::new(config)?;
    match coordinator.run(usernames).await {
        Ok(outcome) => {
            tracing::info!("Harvest completed successfully");
            let stats = CrawlStatistics::from_report(&outcome.report)
                .with_aggregate(&outcome.aggregate);
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
