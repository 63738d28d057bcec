//! Virtual user scheduling
//!
//! This module handles:
//! - Spawning one task per virtual user, each with its own transport and cache
//! - Replaying the page list until the run deadline or iteration cap
//! - Think time between pages
//! - Early stop on an external signal (Ctrl-C)

use crate::config::{Config, PauseConfig};
use crate::crawler::coordinator::PageCrawler;
use crate::crawler::fetcher::Transport;
use crate::metrics::MetricsRecorder;
use crate::url::DomainFilter;
use crate::LoadstormError;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Builds a fresh transport (and cookie jar) for each virtual user
pub type TransportFactory =
    Arc<dyn Fn() -> Result<Box<dyn Transport>, LoadstormError> + Send + Sync>;

/// Parameters of a load run
#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// Number of concurrent virtual users
    pub vus: u32,

    /// Wall-clock budget for the run
    pub duration: Duration,

    /// Maximum passes over the page list per virtual user (0 means unbounded)
    pub iterations: u32,

    /// Think time between pages
    pub pause: PauseConfig,

    /// Asset domains never requested
    pub domain_filter: DomainFilter,

    /// Log every response at debug level
    pub debug_responses: bool,
}

impl LoadPlan {
    /// Builds a plan from the `[load]`, `[pause]` and `[filter]` sections
    pub fn from_config(config: &Config, debug_responses: bool) -> Self {
        Self {
            vus: config.load.vus,
            duration: Duration::from_secs(config.load.duration_secs),
            iterations: config.load.iterations,
            pause: config.pause,
            domain_filter: DomainFilter::new(config.filter.domains.iter().cloned()),
            debug_responses,
        }
    }
}

/// Counters gathered by one virtual user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VuStats {
    /// Completed passes over the page list
    pub iterations: u64,

    /// Page URLs processed
    pub pages_visited: u64,

    /// Page URLs whose check failed
    pub pages_failed: u64,

    /// Distinct assets requested
    pub assets_requested: u64,
}

impl VuStats {
    fn merge(&mut self, other: VuStats) {
        self.iterations += other.iterations;
        self.pages_visited += other.pages_visited;
        self.pages_failed += other.pages_failed;
        self.assets_requested += other.assets_requested;
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub vus: u32,
    pub totals: VuStats,
    pub elapsed: Duration,
    /// True when the run was stopped before its deadline
    pub interrupted: bool,
}

/// Samples the pause between two pages
///
/// Returns a whole number of seconds drawn uniformly from `min..=max`, or zero
/// when `max` is zero.
pub fn pause_duration<R: Rng + ?Sized>(pause: PauseConfig, rng: &mut R) -> Duration {
    if pause.max == 0 || pause.min > pause.max {
        return Duration::ZERO;
    }
    Duration::from_secs(rng.gen_range(pause.min..=pause.max))
}

/// Runs the load test
///
/// Spawns `plan.vus` virtual users that each loop over `pages` until the
/// deadline passes, the iteration cap is hit, or `stop` turns true. Pages are
/// processed strictly one after another within a virtual user.
///
/// # Errors
///
/// Fails only if a transport cannot be built; page and asset failures end up
/// in the metrics.
pub async fn run_load(
    plan: LoadPlan,
    pages: Arc<Vec<String>>,
    transport_factory: TransportFactory,
    recorder: MetricsRecorder,
    stop: watch::Receiver<bool>,
) -> Result<RunStats, LoadstormError> {
    let started = Instant::now();
    let deadline = started + plan.duration;

    tracing::info!(
        "Starting {} virtual users over {} pages for {:?}",
        plan.vus,
        pages.len(),
        plan.duration
    );

    let mut tasks = JoinSet::new();
    for vu in 1..=plan.vus {
        let transport = transport_factory()?;
        let crawler = PageCrawler::new(transport, recorder.clone(), plan.domain_filter.clone())
            .with_debug_responses(plan.debug_responses);

        tasks.spawn(run_virtual_user(
            vu,
            crawler,
            pages.clone(),
            plan.clone(),
            deadline,
            stop.clone(),
        ));
    }

    let mut totals = VuStats::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(stats) => totals.merge(stats),
            Err(e) => tracing::error!("Virtual user task failed: {}", e),
        }
    }

    let interrupted = *stop.borrow();
    let elapsed = started.elapsed();

    tracing::info!(
        "Load run finished: {} pages visited ({} failed) in {:?}",
        totals.pages_visited,
        totals.pages_failed,
        elapsed
    );

    Ok(RunStats {
        vus: plan.vus,
        totals,
        elapsed,
        interrupted,
    })
}

/// One virtual user's main loop
async fn run_virtual_user(
    vu: u32,
    mut crawler: PageCrawler,
    pages: Arc<Vec<String>>,
    plan: LoadPlan,
    deadline: Instant,
    mut stop: watch::Receiver<bool>,
) -> VuStats {
    let mut stats = VuStats::default();
    tracing::debug!("VU {} started", vu);

    'run: loop {
        if plan.iterations > 0 && stats.iterations >= u64::from(plan.iterations) {
            break;
        }

        for url in pages.iter() {
            if Instant::now() >= deadline || *stop.borrow() {
                break 'run;
            }

            let outcome = crawler.crawl_page(url).await;
            stats.pages_visited += 1;
            stats.assets_requested += outcome.assets_requested as u64;
            if !outcome.is_success() {
                stats.pages_failed += 1;
            }

            let pause = pause_duration(plan.pause, &mut rand::thread_rng());
            if pause.is_zero() {
                continue;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::select! {
                _ = tokio::time::sleep(pause.min(remaining)) => {}
                // A closed channel only disables the stop branch
                Ok(()) = stop.changed() => break 'run,
            }
        }

        stats.iterations += 1;
        tracing::debug!("VU {} finished iteration {}", vu, stats.iterations);
    }

    tracing::debug!(
        "VU {} stopped after {} pages, {} cached assets",
        vu,
        stats.pages_visited,
        crawler.cache().len()
    );
    stats
}
