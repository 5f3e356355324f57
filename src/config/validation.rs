use crate::config::types::{
    BackoffConfig, BreakerConfig, Config, FetchConfig, OutputConfig, PipelineConfig,
};
use crate::extract::SelectorStrategy;
use crate::ConfigError;

/// Longest accepted backoff, jitter, cooldown or pause (one day)
pub const MAX_WAIT_SECS: f64 = 86_400.0;

/// Largest accepted backoff multiplier
pub const MAX_MULTIPLIER: f64 = 10.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_backoff_config(&config.backoff)?;
    validate_breaker_config(&config.breaker)?;
    validate_output_config(&config.output)?;
    validate_pipelines(&config.pipelines)?;
    Ok(())
}

/// Validates transport and throttling settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.total_timeout_secs == 0
        || config.connect_timeout_secs == 0
        || config.read_timeout_secs == 0
    {
        return Err(ConfigError::Validation(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    if !(config.rate_per_sec.is_finite() && config.rate_per_sec > 0.0) {
        return Err(ConfigError::Validation(format!(
            "rate-per-sec must be > 0, got {}",
            config.rate_per_sec
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation(format!(
            "burst must be >= 1, got {}",
            config.burst
        )));
    }

    if config.max_concurrency < 1 || config.max_concurrency > 1024 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and 1024, got {}",
            config.max_concurrency
        )));
    }

    Ok(())
}

/// Validates retry timing
fn validate_backoff_config(config: &BackoffConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "attempts must be >= 1, got {}",
            config.attempts
        )));
    }

    for (name, value) in [("base-secs", config.base_secs), ("cap-secs", config.cap_secs)] {
        if !(value > 0.0 && value <= MAX_WAIT_SECS) {
            return Err(ConfigError::Validation(format!(
                "{} must be > 0 and <= {}, got {}",
                name, MAX_WAIT_SECS, value
            )));
        }
    }

    if !(config.jitter_secs >= 0.0 && config.jitter_secs <= MAX_WAIT_SECS) {
        return Err(ConfigError::Validation(format!(
            "jitter-secs must be between 0 and {}, got {}",
            MAX_WAIT_SECS, config.jitter_secs
        )));
    }

    if !(config.multiplier >= 1.0 && config.multiplier <= MAX_MULTIPLIER) {
        return Err(ConfigError::Validation(format!(
            "multiplier must be between 1 and {}, got {}",
            MAX_MULTIPLIER, config.multiplier
        )));
    }

    Ok(())
}

/// Validates circuit breaker settings
fn validate_breaker_config(config: &BreakerConfig) -> Result<(), ConfigError> {
    if config.fail_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "fail-threshold must be >= 1, got {}",
            config.fail_threshold
        )));
    }

    for (name, value) in [
        ("cooldown-secs", config.cooldown_secs),
        ("open-pause-secs", config.open_pause_secs),
    ] {
        if !(value >= 0.0 && value <= MAX_WAIT_SECS) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0 and {}, got {}",
                name, MAX_WAIT_SECS, value
            )));
        }
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("data-path", &config.data_path),
        ("dead-letter-path", &config.dead_letter_path),
        ("health-path", &config.health_path),
        ("cache-dir", &config.cache_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.data_path == config.dead_letter_path {
        return Err(ConfigError::Validation(
            "data-path and dead-letter-path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Keys already used by extracted records
const RESERVED_FIELDS: [&str; 4] = ["url", "selector_idx", "selector_strategy", "struct_changed"];

/// Validates pipeline definitions
fn validate_pipelines(pipelines: &[PipelineConfig]) -> Result<(), ConfigError> {
    for (i, pipeline) in pipelines.iter().enumerate() {
        if pipeline.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "pipeline #{} has an empty name",
                i
            )));
        }

        if pipelines[..i].iter().any(|p| p.name == pipeline.name) {
            return Err(ConfigError::Validation(format!(
                "pipeline '{}' is declared more than once",
                pipeline.name
            )));
        }

        if pipeline.field.is_empty() || RESERVED_FIELDS.contains(&pipeline.field.as_str()) {
            return Err(ConfigError::Validation(format!(
                "pipeline '{}' has an invalid field name '{}'",
                pipeline.name, pipeline.field
            )));
        }

        if pipeline.candidates.is_empty() {
            return Err(ConfigError::Validation(format!(
                "pipeline '{}' must have at least one selector candidate",
                pipeline.name
            )));
        }

        for candidate in &pipeline.candidates {
            if candidate.expr.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "pipeline '{}' has an empty selector expression",
                    pipeline.name
                )));
            }

            if candidate.strategy == SelectorStrategy::Attr && !candidate.expr.contains("::") {
                return Err(ConfigError::Validation(format!(
                    "attr selector '{}' must use the 'selector::attribute' form",
                    candidate.expr
                )));
            }
        }
    }

    Ok(())
}
