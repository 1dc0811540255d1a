//! Rank-Harvester main entry point
//!
//! This is the command-line interface for the Rank-Harvester ladder crawler.

use anyhow::Context;
use clap::Parser;
use rank_harvester::config::{load_config_with_hash, validate_api_key, Config};
use rank_harvester::crawler::harvest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rank-Harvester: an adaptive ranked-ladder crawler
///
/// Rank-Harvester discovers ranked players from the ranking API and keeps
/// harvesting their match history, staying inside the request budget the
/// server declares.
#[derive(Parser, Debug)]
#[command(name = "rank-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An adaptive ranked-ladder crawler", long_about = None)]
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

    /// API key sent with every request
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Validate config and show what would be crawled without sending requests
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Populate API_KEY from .env before clap reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("loading {}", cli.config.display()));
        }
    };
    tracing::info!(hash = %config_hash, "Configuration loaded successfully");

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        let api_key = cli.api_key.unwrap_or_default();
        validate_api_key(&api_key)?;
        handle_harvest(config, &api_key).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rank_harvester=info,warn"),
            1 => EnvFilter::new("rank_harvester=debug,info"),
            2 => EnvFilter::new("rank_harvester=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) {
    use rank_harvester::output::roster_plan;

    println!("=== Rank-Harvester Dry Run ===\n");

    println!("API:");
    println!("  Region: {} ({})", config.api.region, config.api.region.group());
    println!("  League host: {}", config.api.platform_host());
    println!("  Match host: {}", config.api.regional_host());

    println!("\nCrawl:");
    println!("  Queue: {} ({})", config.crawl.queue, config.crawl.queue.id().value());
    println!(
        "  Roster refresh interval: {}s",
        config.crawl.roster_refresh_interval_secs
    );
    println!("  Crawl window: {}s", config.crawl.crawl_window_secs);
    println!("  Match page maximum: {}", config.crawl.match_page_maximum);

    println!("\nClient:");
    println!("  Max retries: {}", config.client.max_retries);
    println!("  Retry base delay: {}ms", config.client.retry_base_delay_ms);
    println!("  Timeout: {}s", config.client.timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let plan = roster_plan(config);
    println!("\nRoster Plan ({} divisions):", plan.len());
    for (tier, division) in &plan {
        println!("  - {} {}", tier, division);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use rank_harvester::output::{load_statistics, print_statistics};
    use rank_harvester::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("opening database")?;
    let stats = load_statistics(&storage).context("querying statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest loop
async fn handle_harvest(config: Config, api_key: &str) -> anyhow::Result<()> {
    tracing::info!(
        region = %config.api.region,
        tiers = config.crawl.tiers.len(),
        database = %config.output.database_path,
        "Launching harvester"
    );

    match harvest(config, api_key).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e).context("harvest loop stopped")
        }
    }
}
