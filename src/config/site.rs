//! Target site resolution
//!
//! The site under test is never part of the config file: it comes from the
//! `SITE_URL` environment variable or an explicit command-line override.

use crate::url::ensure_trailing_slash;
use crate::LoadstormError;
use url::Url;

/// Name of the environment variable holding the target site
pub const SITE_URL_ENV: &str = "SITE_URL";

/// Resolved target of a load run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    /// Site root, always ending in `/`
    pub site_url: String,

    /// Sitemap to resolve page URLs from
    pub sitemap_url: String,
}

/// Reads the target site from an override or the `SITE_URL` environment variable
///
/// # Errors
///
/// Returns `LoadstormError::MissingConfig` when neither is set.
pub fn site_target_from_env(
    site_override: Option<&str>,
    sitemap_override: Option<&str>,
) -> Result<SiteTarget, LoadstormError> {
    let env_value = std::env::var(SITE_URL_ENV).ok();
    resolve_site_target(
        site_override.or(env_value.as_deref()),
        sitemap_override,
    )
}

/// Builds a `SiteTarget` from a raw site URL
///
/// A trailing slash is appended when missing, and the sitemap defaults to
/// `<site>/sitemap.xml`.
pub fn resolve_site_target(
    site_url: Option<&str>,
    sitemap_override: Option<&str>,
) -> Result<SiteTarget, LoadstormError> {
    let raw = site_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LoadstormError::MissingConfig(format!("Missing {} variable", SITE_URL_ENV)))?;

    let site_url = ensure_trailing_slash(raw);
    let parsed = Url::parse(&site_url)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(crate::ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            SITE_URL_ENV, site_url
        ))
        .into());
    }

    let sitemap_url = match sitemap_override {
        Some(sitemap) => {
            Url::parse(sitemap)?;
            sitemap.to_string()
        }
        None => format!("{}sitemap.xml", site_url),
    };

    Ok(SiteTarget {
        site_url,
        sitemap_url,
    })
}
