//! Crawler module for page replay and asset fetching
//!
//! This module contains the core load-generation logic, including:
//! - HTTP transport and batch requests
//! - Sitemap resolution
//! - HTML parsing and asset extraction
//! - Per-session asset caching
//! - Virtual user scheduling

mod assets;
mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod sitemap;

pub use assets::{filter_new_assets, AssetCache};
pub use coordinator::{PageCrawler, PageOutcome};
pub use fetcher::{
    batch_from_urls, build_http_client, BatchRequest, HttpTransport, ResponseRecord, Transport,
};
pub use parser::extract_assets;
pub use scheduler::{pause_duration, run_load, LoadPlan, RunStats, TransportFactory, VuStats};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapResolver};

use crate::config::{Config, SiteTarget};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::output::RunSummary;
use crate::LoadstormError;
use std::sync::Arc;
use tokio::sync::watch;

/// Resolves the page list of a site from its sitemap
///
/// Uses a throwaway transport so the sitemap requests share no cookies with
/// the virtual users and are not counted in the metrics.
pub async fn resolve_pages(
    config: &Config,
    target: &SiteTarget,
) -> Result<Vec<String>, LoadstormError> {
    let transport = HttpTransport::new(&config.request)?;
    SitemapResolver::new(&transport)
        .resolve(&target.sitemap_url)
        .await
}

/// Runs a complete load test
///
/// This is the main entry point for a run. It will:
/// 1. Resolve the sitemap into a page list
/// 2. Spawn the virtual users, each with its own HTTP client
/// 3. Replay the pages and their assets until the run ends
/// 4. Collect the metrics into a `RunSummary`
///
/// # Errors
///
/// Returns an error if the sitemap cannot be resolved or an HTTP client cannot
/// be built. Failures of individual pages and assets are reported through the
/// metrics instead.
pub async fn crawl(
    config: &Config,
    target: &SiteTarget,
    config_hash: &str,
    debug_responses: bool,
    stop: watch::Receiver<bool>,
) -> Result<RunSummary, LoadstormError> {
    let started_at = chrono::Utc::now();
    let pages = resolve_pages(config, target).await?;

    let request = config.request.clone();
    let factory: TransportFactory = Arc::new(move || {
        let transport = HttpTransport::new(&request)?;
        Ok(Box::new(transport) as Box<dyn Transport>)
    });

    let metrics = Arc::new(Metrics::new());
    let recorder = MetricsRecorder::new(metrics.clone());
    let plan = LoadPlan::from_config(config, debug_responses);
    let page_count = pages.len();

    let stats = run_load(plan, Arc::new(pages), factory, recorder, stop).await?;

    Ok(RunSummary::new(
        target,
        config_hash,
        page_count,
        started_at,
        &stats,
        metrics.snapshot(),
    ))
}
