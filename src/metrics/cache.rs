/// Headers that intermediaries use to report a cache hit
///
/// | Header | Emitted by |
/// |--------|------------|
/// | `cf-cache-status` | Cloudflare |
/// | `x-proxy-cache` | generic reverse proxies (nginx) |
/// | `x-lsadc-cache` | LiteSpeed |
/// | `x-cache` | Fastly, KeyCDN, Akamai |
/// | `x-cache-status` | WPX CDN |
pub const CACHE_STATUS_HEADERS: &[&str] = &[
    "cf-cache-status",
    "x-proxy-cache",
    "x-lsadc-cache",
    "x-cache",
    "x-cache-status",
];

/// Infers whether a response was served from a CDN or proxy cache
///
/// Header names and values are compared case-insensitively and the value must
/// be exactly `hit`. A response carrying none of the known headers was not
/// cached.
///
/// # Examples
///
/// ```
/// use loadstorm::metrics::was_cached;
///
/// let headers = vec![("CF-Cache-Status".to_string(), "HIT".to_string())];
/// assert!(was_cached(&headers));
/// assert!(!was_cached(&[]));
/// ```
pub fn was_cached(headers: &[(String, String)]) -> bool {
    headers.iter().any(|(name, value)| {
        CACHE_STATUS_HEADERS
            .iter()
            .any(|known| name.eq_ignore_ascii_case(known))
            && value.eq_ignore_ascii_case("hit")
    })
}
