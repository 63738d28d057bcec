//! Command-line overrides layered on top of the config file

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;

/// Values given on the command line; `None` keeps the file's value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub vus: Option<u32>,
    pub duration_secs: Option<u64>,
    pub pause_min: Option<u64>,
    pub pause_max: Option<u64>,
    pub summary_path: Option<String>,

    /// Appended to `[filter] domains`
    pub exclude_domains: Vec<String>,
}

/// Applies overrides to a loaded config and validates the result
///
/// # Errors
///
/// Returns `ConfigError::Validation` if the combined config is invalid, e.g.
/// `--pause-min` above the file's `max`.
pub fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
    if let Some(vus) = overrides.vus {
        config.load.vus = vus;
    }
    if let Some(duration) = overrides.duration_secs {
        config.load.duration_secs = duration;
    }
    if let Some(min) = overrides.pause_min {
        config.pause.min = min;
    }
    if let Some(max) = overrides.pause_max {
        config.pause.max = max;
    }
    if let Some(path) = &overrides.summary_path {
        config.output.summary_path = path.clone();
    }
    config
        .filter
        .domains
        .extend(overrides.exclude_domains.iter().cloned());

    validate(config)
}
