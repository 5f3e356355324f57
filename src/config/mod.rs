//! Configuration module for Scrape-Guardrails
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: `Config::default()` carries the stock
//! throttling, retry and breaker settings plus the built-in pipelines.
//!
//! # Example
//!
//! ```no_run
//! use scrape_guardrails::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("guardrails.toml")).unwrap();
//! println!("Retry attempts: {}", config.backoff.attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffConfig, BreakerConfig, Config, FetchConfig, OutputConfig, PipelineConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
