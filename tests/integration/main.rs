//! Integration tests for Scrape-Guardrails
//!
//! These tests use wiremock to serve documents and drive full fetches and
//! pipeline runs end-to-end.

mod fetch_tests;
mod pipeline_tests;

use scrape_guardrails::config::Config;
use std::path::Path;

/// Configuration with millisecond backoff and a generous rate limit
///
/// Output paths point into `dir`.
pub fn fast_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.fetch.rate_per_sec = 1000.0;
    config.fetch.burst = 100;
    config.backoff.attempts = 3;
    config.backoff.base_secs = 0.001;
    config.backoff.cap_secs = 0.005;
    config.backoff.jitter_secs = 0.001;
    config.breaker.fail_threshold = 100;
    config.breaker.open_pause_secs = 0.001;
    config.output.data_path = dir.join("out/data.jsonl").display().to_string();
    config.output.dead_letter_path = dir.join("out/dead_letter.jsonl").display().to_string();
    config.output.health_path = dir.join("out/health.json").display().to_string();
    config.output.cache_dir = dir.join(".cache").display().to_string();
    config
}
