//! HTML parser for extracting static asset references
//!
//! This module scans a fetched page for the assets a browser would load
//! alongside it:
//! - Stylesheets (`<link rel="stylesheet" href="...">`)
//! - Scripts (`<script src="...">`)
//! - Images (`<img src="...">`)
//!
//! Nested assets (CSS `@import`, images loaded by scripts) are not followed.

use crate::url::normalize_asset_url;
use scraper::{Html, Selector};

/// Asset reference kinds, in the order they are scanned
const ASSET_SELECTORS: &[(&str, &str)] = &[
    (r#"link[rel="stylesheet"]"#, "href"),
    ("script", "src"),
    ("img", "src"),
];

/// Extracts normalized asset URLs from page markup
///
/// # Extraction Rules
///
/// All stylesheets are returned first, then scripts, then images; within each
/// kind the order is document order.
///
/// **Skipped:**
/// - Elements without the relevant attribute (e.g. inline `<script>`)
/// - References that are not absolute or protocol-relative (`/x.js`,
///   `x.js`), as decided by `normalize_asset_url`
///
/// An attribute that is present but empty counts as present and is passed to
/// the normalizer, which rejects it.
///
/// # Example
///
/// ```
/// use loadstorm::crawler::extract_assets;
///
/// let html = r#"<html><head><script src="//cdn.com/b.js"></script></head></html>"#;
/// assert_eq!(extract_assets(html), vec!["https://cdn.com/b.js".to_string()]);
/// ```
pub fn extract_assets(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut assets = Vec::new();

    for (selector, attr) in ASSET_SELECTORS {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                if let Some(url) = normalize_asset_url(value) {
                    assets.push(url);
                }
            }
        }
    }

    assets
}
