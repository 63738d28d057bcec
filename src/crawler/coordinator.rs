//! Page crawler - per-session page and asset orchestration
//!
//! A `PageCrawler` is one virtual user's view of the site. For every page URL
//! it:
//! - Fetches the page and checks that it returned 200
//! - Records the response (or the failure) into the shared metrics
//! - Extracts asset references and drops the ones already seen or filtered
//! - Fetches the remaining assets as one concurrent batch
//! - Folds those assets into its session cache

use crate::crawler::assets::{filter_new_assets, AssetCache};
use crate::crawler::fetcher::{batch_from_urls, ResponseRecord, Transport};
use crate::crawler::parser::extract_assets;
use crate::metrics::MetricsRecorder;
use crate::state::CrawlStage;
use crate::url::DomainFilter;
use crate::LoadstormError;
use reqwest::Method;

/// What happened to a single page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// The page URL
    pub url: String,

    /// Terminal stage reached (`Done` or `Failed`)
    pub stage: CrawlStage,

    /// Page status code, if a response was received
    pub status: Option<u16>,

    /// Assets requested for this page
    pub assets_requested: usize,

    /// Requested assets whose check failed
    pub assets_failed: usize,

    /// Reason the page failed, if it did
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn is_success(&self) -> bool {
        self.stage == CrawlStage::Done
    }
}

/// Per-session page crawler
pub struct PageCrawler {
    transport: Box<dyn Transport>,
    recorder: MetricsRecorder,
    domain_filter: DomainFilter,
    cache: AssetCache,
    debug_responses: bool,
}

impl PageCrawler {
    /// Creates a crawler with an empty asset cache
    pub fn new(
        transport: Box<dyn Transport>,
        recorder: MetricsRecorder,
        domain_filter: DomainFilter,
    ) -> Self {
        Self {
            transport,
            recorder,
            domain_filter,
            cache: AssetCache::new(),
            debug_responses: false,
        }
    }

    /// Logs every response (without body) at debug level
    pub fn with_debug_responses(mut self, enabled: bool) -> Self {
        self.debug_responses = enabled;
        self
    }

    /// Assets this session has already requested
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Processes one page URL
    ///
    /// A failed page check is recorded and ends this page only; it is returned
    /// as a `Failed` outcome rather than an error so the caller can move on to
    /// the next page.
    pub async fn crawl_page(&mut self, url: &str) -> PageOutcome {
        let mut outcome = PageOutcome {
            url: url.to_string(),
            stage: CrawlStage::Fetching,
            status: None,
            assets_requested: 0,
            assets_failed: 0,
            error: None,
        };

        if let Err(e) = self.process_page(url, &mut outcome).await {
            if e.is_fatal() {
                tracing::error!("Page {} aborted at stage {}: {}", url, outcome.stage, e);
            } else {
                tracing::debug!("Page {} ended at stage {}: {}", url, outcome.stage, e);
            }
            outcome.stage = CrawlStage::Failed;
            outcome.error = Some(e.to_string());
        }

        outcome
    }

    async fn process_page(
        &mut self,
        url: &str,
        outcome: &mut PageOutcome,
    ) -> Result<(), LoadstormError> {
        tracing::debug!("Fetching page {}", url);
        let result = self.transport.get(url).await;

        if let Ok(response) = &result {
            outcome.status = Some(response.status);
            outcome.stage = outcome.stage.advance(CrawlStage::Checking)?;
        }
        let response = self.check(url, result)?;

        outcome.stage = outcome.stage.advance(CrawlStage::ExtractingAssets)?;
        let candidates = extract_assets(&response.body);
        let new_assets = filter_new_assets(candidates, &self.cache, &self.domain_filter);

        if new_assets.is_empty() {
            outcome.stage = outcome.stage.advance(CrawlStage::Done)?;
            return Ok(());
        }

        outcome.stage = outcome.stage.advance(CrawlStage::FetchingAssets)?;
        outcome.assets_requested = new_assets.len();
        outcome.assets_failed = self.fetch_assets(&new_assets).await;

        // Failed assets are still seen and never retried
        self.cache.extend(new_assets);

        outcome.stage = outcome.stage.advance(CrawlStage::Done)?;
        Ok(())
    }

    /// Fetches a batch of assets and returns how many failed their check
    async fn fetch_assets(&self, assets: &[String]) -> usize {
        tracing::debug!("Fetching {} new assets", assets.len());

        let requests = batch_from_urls(assets, Method::GET, None);
        let responses = self.transport.batch_get(requests).await;

        // Each asset is checked on its own; one failure does not stop the rest
        let mut failed = 0;
        for (url, result) in assets.iter().zip(responses) {
            if self.check(url, result).is_err() {
                failed += 1;
            }
        }
        failed
    }

    /// Runs the "response is OK" check and records the outcome
    ///
    /// Exactly one of `record_response` or `record_failure` is called per
    /// fetch. Transport errors fail the check like a bad status does.
    fn check(
        &self,
        url: &str,
        result: Result<ResponseRecord, LoadstormError>,
    ) -> Result<ResponseRecord, LoadstormError> {
        let response = result.map_err(|e| self.recorder.record_failure(url, e.to_string()))?;

        if self.debug_responses {
            tracing::debug!(
                url = %response.url,
                status = response.status,
                duration_ms = response.duration.as_millis() as u64,
                headers = ?response.headers,
                "Response"
            );
        }

        if !response.is_ok() {
            return Err(self.recorder.record_failure(
                url,
                format!("status code was {}, expected 200", response.status),
            ));
        }

        let class = self.recorder.record_response(&response);
        tracing::trace!("Recorded {} as {:?}", url, class);
        Ok(response)
    }
}
