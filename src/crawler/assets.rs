//! Per-session asset cache and new-asset filtering
//!
//! A virtual user behaves like a browser with a warm cache: once an asset has
//! been requested in a session it is never requested again by that session.

use crate::url::DomainFilter;
use std::collections::HashSet;

/// Ordered, append-only set of asset URLs already requested in a session
///
/// One cache belongs to exactly one virtual user. It only grows, and a failed
/// asset fetch still counts as seen.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Appends assets in order, ignoring any already present
    pub fn extend<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.order.push(url);
            }
        }
    }

    /// Cached URLs in insertion order
    pub fn urls(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Selects the assets of a page that still need to be requested
///
/// Runs two order-preserving passes over `candidates`:
/// 1. drop exact matches already in `already_seen`
/// 2. drop URLs containing any `domain_filter` entry as a substring
///
/// `already_seen` is not modified; merging the result back is the caller's
/// job. Duplicates within `candidates` itself are kept.
///
/// # Example
///
/// ```
/// use loadstorm::crawler::{filter_new_assets, AssetCache};
/// use loadstorm::url::DomainFilter;
///
/// let mut seen = AssetCache::new();
/// seen.extend(["https://a.com/1.js".to_string()]);
///
/// let new_assets = filter_new_assets(
///     vec!["https://a.com/1.js".to_string(), "https://b.com/2.js".to_string()],
///     &seen,
///     &DomainFilter::new(["b.com"]),
/// );
/// assert!(new_assets.is_empty());
/// ```
pub fn filter_new_assets(
    candidates: Vec<String>,
    already_seen: &AssetCache,
    domain_filter: &DomainFilter,
) -> Vec<String> {
    let mut assets: Vec<String> = candidates
        .into_iter()
        .filter(|url| !already_seen.contains(url))
        .collect();

    for domain in domain_filter.domains() {
        assets.retain(|url| !url.contains(domain.as_str()));
    }

    assets
}
