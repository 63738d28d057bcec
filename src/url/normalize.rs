const HTTPS_PREFIX: &str = "https://";
const HTTP_PREFIX: &str = "http://";
const PROTOCOL_RELATIVE_PREFIX: &str = "//";

/// Normalizes a discovered asset reference into an absolute HTTPS URL
///
/// # Normalization Rules
///
/// | Input | Result |
/// |-------|--------|
/// | `https://...` | unchanged |
/// | `http://...` | scheme rewritten to `https://` |
/// | `//host/...` | prefixed with `https:` |
/// | anything else | `None` |
///
/// Root-relative (`/path`) and document-relative references are rejected
/// rather than resolved, so callers must treat `None` as "skip this
/// candidate". No further validation is performed on the rest of the URL.
///
/// # Examples
///
/// ```
/// use loadstorm::url::normalize_asset_url;
///
/// assert_eq!(
///     normalize_asset_url("http://a.com/x.js").as_deref(),
///     Some("https://a.com/x.js")
/// );
/// assert_eq!(
///     normalize_asset_url("//a.com/x.js").as_deref(),
///     Some("https://a.com/x.js")
/// );
/// assert_eq!(normalize_asset_url("/x.js"), None);
/// ```
pub fn normalize_asset_url(raw: &str) -> Option<String> {
    if raw.starts_with(HTTPS_PREFIX) {
        Some(raw.to_string())
    } else if let Some(rest) = raw.strip_prefix(HTTP_PREFIX) {
        Some(format!("{}{}", HTTPS_PREFIX, rest))
    } else if raw.starts_with(PROTOCOL_RELATIVE_PREFIX) {
        Some(format!("https:{}", raw))
    } else {
        None
    }
}
