//! Loadstorm: a sitemap-driven website load tester
//!
//! This crate discovers a site's pages through its sitemap, replays them under
//! concurrent virtual users, fetches every page's static assets the way a
//! browser with a warm cache would, and aggregates latency, error and cache-hit
//! metrics for the run.

pub mod config;
pub mod crawler;
pub mod metrics;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Loadstorm operations
#[derive(Debug, Error)]
pub enum LoadstormError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch of {url} failed: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Sitemap {url} did not contain any urls")]
    EmptySitemap { url: String },

    #[error("Check failed for {url}: {reason}")]
    CheckFailed { url: String, reason: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Sitemap parse error for {url}: {message}")]
    SitemapParse { url: String, message: String },

    #[error("Invalid stage transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlStage,
        to: state::CrawlStage,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl LoadstormError {
    /// Returns true for errors that are not a recorded check failure
    ///
    /// Check failures are absorbed into the metrics by the page crawler; any
    /// other error means the run (or the page's state machine) is broken.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CheckFailed { .. })
    }
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Loadstorm operations
pub type Result<T> = std::result::Result<T, LoadstormError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{PageCrawler, ResponseRecord, SitemapResolver, Transport};
pub use metrics::{Metrics, MetricsRecorder};
pub use state::CrawlStage;
pub use url::{normalize_asset_url, DomainFilter};
