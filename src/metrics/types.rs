//! Metric primitives
//!
//! `Rate`, `Counter` and `Trend` are safe to share between virtual users; all
//! updates are commutative so no ordering between sessions is required.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Monotonic counter
#[derive(Debug)]
pub struct Counter {
    name: &'static str,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicU64::new(0),
        }
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::SeqCst);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Fraction of non-zero samples
#[derive(Debug)]
pub struct Rate {
    name: &'static str,
    passes: AtomicU64,
    total: AtomicU64,
}

impl Rate {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            passes: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Adds one sample; `true` counts towards the rate
    pub fn add(&self, sample: bool) {
        if sample {
            self.passes.fetch_add(1, Ordering::SeqCst);
        }
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Returns the ratio of passing samples, or 0.0 with no samples
    pub fn rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.passes() as f64 / total as f64
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn summary(&self) -> RateSummary {
        // Read passes first so a concurrent add never reports passes > total
        let passes = self.passes();
        let total = self.total().max(passes);
        RateSummary {
            name: self.name,
            passes,
            total,
        }
    }
}

/// Collection of duration samples
#[derive(Debug)]
pub struct Trend {
    name: &'static str,
    samples: Mutex<Vec<Duration>>,
}

impl Trend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, sample: Duration) {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sample);
    }

    pub fn count(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Computes aggregate statistics over the samples recorded so far
    pub fn summary(&self) -> TrendSummary {
        let mut sorted = self
            .samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        sorted.sort_unstable();

        if sorted.is_empty() {
            return TrendSummary {
                name: self.name,
                ..TrendSummary::default()
            };
        }

        let total: Duration = sorted.iter().sum();
        TrendSummary {
            name: self.name,
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: total / sorted.len() as u32,
            med: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
        }
    }
}

/// Linearly interpolated percentile over sorted samples
fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    let low = sorted[lower];
    let high = sorted[upper];
    low + (high - low).mul_f64(weight)
}

/// Point-in-time view of a `Rate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSummary {
    pub name: &'static str,
    pub passes: u64,
    pub total: u64,
}

impl RateSummary {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passes as f64 / self.total as f64
    }
}

/// Point-in-time view of a `Trend`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendSummary {
    pub name: &'static str,
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    pub med: Duration,
    pub p90: Duration,
    pub p95: Duration,
}
