//! Loadstorm main entry point
//!
//! This is the command-line interface for the Loadstorm website load tester.

use anyhow::{bail, Context};
use clap::Parser;
use loadstorm::config::{
    apply_overrides, hash_content, load_config_with_hash, site_target_from_env, Config,
    ConfigOverrides, SiteTarget,
};
use loadstorm::crawler::{crawl, resolve_pages};
use loadstorm::output::{generate_markdown_report, print_summary};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Loadstorm: a sitemap-driven website load tester
///
/// Loadstorm reads the pages of a site from its sitemap and replays them with
/// concurrent virtual users, loading every page's stylesheets, scripts and
/// images the way a browser with a warm cache would. The site is taken from
/// the SITE_URL environment variable unless --site-url is given.
#[derive(Parser, Debug)]
#[command(name = "loadstorm")]
#[command(version)]
#[command(about = "A sitemap-driven website load tester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Site under test (overrides SITE_URL)
    #[arg(long, value_name = "URL")]
    site_url: Option<String>,

    /// Sitemap to read pages from (defaults to <site>/sitemap.xml)
    #[arg(long, value_name = "URL")]
    sitemap_url: Option<String>,

    /// Number of virtual users
    #[arg(long)]
    vus: Option<u32>,

    /// Run duration in seconds
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Minimum pause between pages in seconds
    #[arg(long, value_name = "SECS")]
    pause_min: Option<u64>,

    /// Maximum pause between pages in seconds
    #[arg(long, value_name = "SECS")]
    pause_max: Option<u64>,

    /// Never request assets whose URL contains this domain (repeatable)
    #[arg(long, value_name = "DOMAIN")]
    exclude_domain: Vec<String>,

    /// Where to write the markdown report (empty disables it)
    #[arg(long, value_name = "PATH")]
    summary_path: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the sitemap pages without generating load
    #[arg(long)]
    dry_run: bool,

    /// Log every response (status, headers, duration) at debug level
    #[arg(long)]
    debug_responses: bool,

    /// Exit with an error when any check failed
    #[arg(long)]
    fail_on_errors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_effective_config(&cli)?;
    let target = site_target_from_env(cli.site_url.as_deref(), cli.sitemap_url.as_deref())
        .context("Failed to resolve the site under test")?;

    tracing::info!(
        "Target {} (sitemap {}), config hash {}",
        target.site_url,
        target.sitemap_url,
        config_hash
    );

    if cli.dry_run {
        return handle_dry_run(&config, &target).await;
    }

    handle_run(&config, &target, &config_hash, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("loadstorm=info,warn"),
            1 => EnvFilter::new("loadstorm=debug,info"),
            2 => EnvFilter::new("loadstorm=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides and validates
/// the result
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, String)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            (Config::default(), hash_content(""))
        }
    };

    let overrides = ConfigOverrides {
        vus: cli.vus,
        duration_secs: cli.duration,
        pause_min: cli.pause_min,
        pause_max: cli.pause_max,
        summary_path: cli.summary_path.clone(),
        exclude_domains: cli.exclude_domain.clone(),
    };
    apply_overrides(&mut config, &overrides)
        .context("Invalid configuration after command-line overrides")?;

    Ok((config, hash))
}

/// Handles the --dry-run mode: shows the configuration and the pages that
/// would be visited
async fn handle_dry_run(config: &Config, target: &SiteTarget) -> anyhow::Result<()> {
    println!("=== Loadstorm Dry Run ===\n");

    println!("Target:");
    println!("  Site: {}", target.site_url);
    println!("  Sitemap: {}", target.sitemap_url);

    println!("\nLoad:");
    println!("  Virtual users: {}", config.load.vus);
    println!("  Duration: {}s", config.load.duration_secs);
    if config.load.iterations > 0 {
        println!("  Iterations per VU: {}", config.load.iterations);
    }
    println!("  Pause: {}..={}s", config.pause.min, config.pause.max);

    println!("\nRequest:");
    println!("  User agent: {}", config.request.user_agent);
    println!("  Timeout: {}s", config.request.timeout_secs);
    for (name, value) in &config.request.headers {
        println!("  Header: {}: {}", name, value);
    }

    println!("\nExcluded Asset Domains ({}):", config.filter.domains.len());
    for domain in &config.filter.domains {
        println!("  - {}", domain);
    }

    let pages = resolve_pages(config, target)
        .await
        .context("Failed to resolve sitemap")?;

    println!("\nPages ({}):", pages.len());
    for page in &pages {
        println!("  - {}", page);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start {} virtual users over {} pages",
        config.load.vus,
        pages.len()
    );

    Ok(())
}

/// Handles the main load run
async fn handle_run(
    config: &Config,
    target: &SiteTarget,
    config_hash: &str,
    cli: &Cli,
) -> anyhow::Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping virtual users");
            let _ = stop_tx.send(true);
        }
    });

    let summary = match crawl(config, target, config_hash, cli.debug_responses, stop_rx).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Load run failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_summary(&summary);
    }

    if !config.output.summary_path.is_empty() {
        let path = Path::new(&config.output.summary_path);
        generate_markdown_report(&summary, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    if cli.fail_on_errors && summary.has_errors() {
        bail!(
            "{} checks failed ({:.2}% error rate)",
            summary.metrics.error_count,
            summary.error_rate()
        );
    }

    Ok(())
}
