use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Loadstorm
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub load: LoadConfig,
    pub request: RequestConfig,
    pub filter: FilterConfig,
    pub pause: PauseConfig,
    pub output: OutputConfig,
}

/// Virtual user configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of concurrent virtual users
    pub vus: u32,

    /// Total run duration (seconds)
    #[serde(rename = "duration-secs")]
    pub duration_secs: u64,

    /// Maximum sitemap passes per virtual user (0 means unbounded)
    pub iterations: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            vus: 10,
            duration_secs: 60,
            iterations: 0,
        }
    }
}

/// Parameters shared by every request a virtual user issues
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "accept-encoding".to_string(),
            "gzip, br, deflate".to_string(),
        );

        Self {
            timeout_secs: 30,
            user_agent: format!("loadstorm/{}", env!("CARGO_PKG_VERSION")),
            headers,
        }
    }
}

/// Asset domain exclusion
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Substrings; any asset URL containing one of them is never fetched
    pub domains: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            domains: vec!["googleapis.com".to_string()],
        }
    }
}

/// Think time between pages (whole seconds, inclusive bounds)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    pub min: u64,
    pub max: u64,
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the markdown report (empty disables it)
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_path: "summary.md".to_string(),
        }
    }
}
