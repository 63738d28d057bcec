use crate::config::types::{Config, FilterConfig, LoadConfig, PauseConfig, RequestConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

const MAX_VUS: u32 = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_load_config(&config.load)?;
    validate_request_config(&config.request)?;
    validate_filter_config(&config.filter)?;
    validate_pause_config(&config.pause)?;
    Ok(())
}

/// Validates virtual user settings
fn validate_load_config(config: &LoadConfig) -> Result<(), ConfigError> {
    if config.vus < 1 || config.vus > MAX_VUS {
        return Err(ConfigError::Validation(format!(
            "vus must be between 1 and {}, got {}",
            MAX_VUS, config.vus
        )));
    }

    if config.duration_secs < 1 {
        return Err(ConfigError::Validation(
            "duration-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates shared request parameters
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}

/// Validates the asset domain filter
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    // An empty entry would be a substring of every URL and exclude all assets
    if config.domains.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "filter domains cannot contain empty entries".to_string(),
        ));
    }
    Ok(())
}

/// Validates think-time bounds
fn validate_pause_config(config: &PauseConfig) -> Result<(), ConfigError> {
    if config.min > config.max {
        return Err(ConfigError::Validation(format!(
            "pause min ({}) must not exceed pause max ({})",
            config.min, config.max
        )));
    }
    Ok(())
}
