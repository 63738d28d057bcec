//! Configuration module for Loadstorm
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving the target site from the environment.
//!
//! # Example
//!
//! ```no_run
//! use loadstorm::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("loadstorm.toml")).unwrap();
//! println!("Running {} virtual users", config.load.vus);
//! ```

mod overrides;
mod parser;
mod site;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FilterConfig, LoadConfig, OutputConfig, PauseConfig, RequestConfig};

pub use overrides::{apply_overrides, ConfigOverrides};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config};
pub use site::{resolve_site_target, site_target_from_env, SiteTarget, SITE_URL_ENV};
pub use validation::validate;
