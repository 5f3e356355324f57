//! Scrape-Guardrails: fault-tolerant batch scraping
//!
//! This crate fetches remote documents through a token-bucket rate limiter,
//! a circuit breaker and an exponential-backoff retry executor, fans the
//! fetches out concurrently, and routes every input URL to exactly one of two
//! JSONL sinks (extracted records or dead letters) before writing a run
//! health report.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod url;

use thiserror::Error;

pub use fetch::FetchError;

/// Main error type for Scrape-Guardrails operations
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Input URL list error: {0}")]
    InputList(String),

    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Sink error for {path}: {source}")]
    Sink {
        path: String,
        source: std::io::Error,
    },

    #[error("Snapshot error for {url}: {source}")]
    Snapshot {
        url: String,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Scrape-Guardrails operations
pub type GuardResult<T> = std::result::Result<T, GuardError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{BackoffPolicy, CircuitBreaker, FetchClient, RateLimiter, RetryExecutor};
pub use pipeline::{Orchestrator, RunSummary};
