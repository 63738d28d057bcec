//! Output module for run summaries and reports
//!
//! This module handles:
//! - Assembling a `RunSummary` from the metrics and scheduler totals
//! - Printing an end-of-test summary to stdout
//! - Writing a markdown report

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::print_summary;

use crate::config::SiteTarget;
use crate::crawler::RunStats;
use crate::metrics::MetricsSnapshot;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything reported at the end of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub site_url: String,
    pub sitemap_url: String,
    pub config_hash: String,

    /// RFC 3339 timestamps
    pub started_at: String,
    pub finished_at: String,
    pub duration_seconds: f64,

    pub vus: u32,
    pub iterations: u64,

    /// Pages listed by the sitemap
    pub sitemap_pages: usize,
    pub pages_visited: u64,
    pub pages_failed: u64,
    pub assets_requested: u64,

    /// Stopped by Ctrl-C before the deadline
    pub interrupted: bool,

    pub metrics: MetricsSnapshot,
}

impl RunSummary {
    /// Builds the summary of a finished run, stamped with the current time
    pub fn new(
        target: &SiteTarget,
        config_hash: &str,
        sitemap_pages: usize,
        started_at: DateTime<Utc>,
        stats: &RunStats,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            site_url: target.site_url.clone(),
            sitemap_url: target.sitemap_url.clone(),
            config_hash: config_hash.to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            duration_seconds: stats.elapsed.as_secs_f64(),
            vus: stats.vus,
            iterations: stats.totals.iterations,
            sitemap_pages,
            pages_visited: stats.totals.pages_visited,
            pages_failed: stats.totals.pages_failed,
            assets_requested: stats.totals.assets_requested,
            interrupted: stats.interrupted,
            metrics,
        }
    }

    /// Percentage of checks that failed
    pub fn error_rate(&self) -> f64 {
        self.metrics.errors.rate() * 100.0
    }

    /// Percentage of successful responses served from a cache
    pub fn cache_hit_rate(&self) -> f64 {
        self.metrics.response_cached.rate() * 100.0
    }

    /// True when at least one check failed
    pub fn has_errors(&self) -> bool {
        self.metrics.error_count > 0
    }

    /// Requests per second over the whole run
    pub fn request_rate(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.metrics.requests as f64 / self.duration_seconds
        } else {
            0.0
        }
    }
}
