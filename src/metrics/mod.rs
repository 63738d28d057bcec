//! Metrics module for Loadstorm
//!
//! This module handles:
//! - Rate, counter and trend primitives shared across virtual users
//! - Cache-hit inference from CDN/proxy response headers
//! - Classifying responses into page and asset latency
//! - Snapshotting the aggregate for reporting

mod cache;
mod recorder;
mod types;

pub use cache::{was_cached, CACHE_STATUS_HEADERS};
pub use recorder::{Metrics, MetricsRecorder, MetricsSnapshot, ResourceClass};
pub use types::{Counter, Rate, RateSummary, Trend, TrendSummary};
