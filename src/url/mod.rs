//! URL handling module for Loadstorm
//!
//! This module provides asset URL normalization, substring-based domain
//! exclusion, and small helpers for the site URL.

mod domain;
mod normalize;

// Re-export main types and functions
pub use domain::DomainFilter;
pub use normalize::normalize_asset_url;

/// Appends a trailing slash to a URL if it does not already end with one
///
/// # Examples
///
/// ```
/// use loadstorm::url::ensure_trailing_slash;
///
/// assert_eq!(ensure_trailing_slash("https://example.com"), "https://example.com/");
/// assert_eq!(ensure_trailing_slash("https://example.com/"), "https://example.com/");
/// ```
pub fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
