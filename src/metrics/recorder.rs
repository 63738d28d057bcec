//! Run-wide metric aggregation
//!
//! One `Metrics` value is created per run and shared, through cloned
//! `MetricsRecorder` handles, by every virtual user. Every fetched page or
//! asset goes through exactly one of `record_response` or `record_failure`.

use crate::crawler::ResponseRecord;
use crate::metrics::cache::was_cached;
use crate::metrics::types::{Counter, Rate, RateSummary, Trend, TrendSummary};
use crate::LoadstormError;
use std::sync::Arc;

/// Named metrics collected over a run
#[derive(Debug)]
pub struct Metrics {
    /// Share of checks that failed
    pub error_rate: Rate,

    /// Number of failed checks
    pub error_count: Counter,

    /// Latency of HTML responses
    pub page_response_time: Trend,

    /// Latency of every other response
    pub asset_response_time: Trend,

    /// Share of responses served from an intermediary cache
    pub response_cache_rate: Rate,

    /// Every recorded response or failure
    pub requests: Counter,

    /// Body bytes of recorded responses
    pub bytes_received: Counter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            error_rate: Rate::new("errors"),
            error_count: Counter::new("errorCounter"),
            page_response_time: Trend::new("PageResponseTime"),
            asset_response_time: Trend::new("AssetResponseTime"),
            response_cache_rate: Rate::new("response_cached"),
            requests: Counter::new("requests"),
            bytes_received: Counter::new("data_received"),
        }
    }

    /// Captures the current value of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            errors: self.error_rate.summary(),
            error_count: self.error_count.value(),
            page_response_time: self.page_response_time.summary(),
            asset_response_time: self.asset_response_time.summary(),
            response_cached: self.response_cache_rate.summary(),
            requests: self.requests.value(),
            bytes_received: self.bytes_received.value(),
        }
    }
}

/// Immutable copy of all metrics, handed to the reporting layer
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub errors: RateSummary,
    pub error_count: u64,
    pub page_response_time: TrendSummary,
    pub asset_response_time: TrendSummary,
    pub response_cached: RateSummary,
    pub requests: u64,
    pub bytes_received: u64,
}

/// Resource class a response is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Page,
    Asset,
}

impl ResourceClass {
    /// Classifies a response by its Content-Type header
    pub fn of(record: &ResponseRecord) -> Self {
        match record.header("content-type") {
            Some(content_type) if content_type.contains("text/html") => Self::Page,
            _ => Self::Asset,
        }
    }
}

/// Cloneable handle that feeds the shared `Metrics`
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    metrics: Arc<Metrics>,
}

impl MetricsRecorder {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Records a response that passed its check
    ///
    /// Adds a "no error" sample and a cache-hit sample, then files the
    /// response duration under page or asset latency depending on whether the
    /// Content-Type contains `text/html`.
    pub fn record_response(&self, record: &ResponseRecord) -> ResourceClass {
        let metrics = &self.metrics;

        metrics.response_cache_rate.add(was_cached(&record.headers));
        metrics.error_rate.add(false);
        metrics.requests.add(1);
        metrics.bytes_received.add(record.body.len() as u64);

        let class = ResourceClass::of(record);
        match class {
            ResourceClass::Page => metrics.page_response_time.add(record.duration),
            ResourceClass::Asset => metrics.asset_response_time.add(record.duration),
        }
        class
    }

    /// Records a failed check and returns the error that ends the unit of work
    ///
    /// The caller is expected to propagate the returned
    /// `LoadstormError::CheckFailed`.
    pub fn record_failure(&self, url: &str, reason: impl Into<String>) -> LoadstormError {
        let reason = reason.into();
        self.metrics.error_rate.add(true);
        self.metrics.error_count.add(1);
        self.metrics.requests.add(1);

        tracing::warn!("Check failed for {}: {}", url, reason);

        LoadstormError::CheckFailed {
            url: url.to_string(),
            reason,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
