use crate::extract::{SelectorCandidate, SelectorStrategy};
use serde::Deserialize;

/// Main configuration structure for Scrape-Guardrails
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub backoff: BackoffConfig,
    pub breaker: BreakerConfig,
    pub output: OutputConfig,
    #[serde(rename = "pipeline")]
    pub pipelines: Vec<PipelineConfig>,
}

impl Config {
    /// Looks up a pipeline by name
    ///
    /// Pipelines declared in the configuration shadow the built-in ones.
    pub fn pipeline(&self, name: &str) -> Option<PipelineConfig> {
        self.pipelines
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .or_else(|| builtin_pipeline(name))
    }

    /// Names of every pipeline that can be run, configured ones first
    pub fn pipeline_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipelines.iter().map(|p| p.name.clone()).collect();
        for builtin in BUILTIN_PIPELINES {
            if !names.iter().any(|n| n == builtin) {
                names.push(builtin.to_string());
            }
        }
        names
    }
}

/// Transport and throttling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "total-timeout-secs")]
    pub total_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Per-read timeout (seconds)
    #[serde(rename = "read-timeout-secs")]
    pub read_timeout_secs: u64,

    /// Maximum redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Token bucket refill rate (requests per second)
    #[serde(rename = "rate-per-sec")]
    pub rate_per_sec: f64,

    /// Token bucket capacity (burst size)
    pub burst: u32,

    /// Maximum number of URLs in flight at once
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "GuardrailsBot/1.0 (+https://example.com)".to_string(),
            total_timeout_secs: 30,
            connect_timeout_secs: 10,
            read_timeout_secs: 20,
            max_redirects: 10,
            rate_per_sec: 1.5,
            burst: 3,
            max_concurrency: 8,
        }
    }
}

/// Retry timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Maximum number of attempts per fetch
    pub attempts: u32,

    /// Initial delay (seconds)
    #[serde(rename = "base-secs")]
    pub base_secs: f64,

    /// Upper bound on the exponential delay (seconds)
    #[serde(rename = "cap-secs")]
    pub cap_secs: f64,

    /// Upper bound of the uniform random jitter added to each delay (seconds)
    #[serde(rename = "jitter-secs")]
    pub jitter_secs: f64,

    /// Growth factor applied to the delay after each failure
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            attempts: 6,
            base_secs: 0.4,
            cap_secs: 8.0,
            jitter_secs: 0.4,
            multiplier: 2.0,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures needed to open the circuit
    #[serde(rename = "fail-threshold")]
    pub fail_threshold: u32,

    /// How long the circuit stays open (seconds)
    #[serde(rename = "cooldown-secs")]
    pub cooldown_secs: f64,

    /// Pause taken by the retry loop when it finds the circuit open (seconds)
    #[serde(rename = "open-pause-secs")]
    pub open_pause_secs: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            fail_threshold: 8,
            cooldown_secs: 15.0,
            open_pause_secs: 1.0,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSONL file receiving extracted records
    #[serde(rename = "data-path")]
    pub data_path: String,

    /// JSONL file receiving failed URLs
    #[serde(rename = "dead-letter-path")]
    pub dead_letter_path: String,

    /// JSON run health report
    #[serde(rename = "health-path")]
    pub health_path: String,

    /// Directory holding the latest raw snapshot of every URL
    #[serde(rename = "cache-dir")]
    pub cache_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: "out/data.jsonl".to_string(),
            dead_letter_path: "out/dead_letter.jsonl".to_string(),
            health_path: "out/health.json".to_string(),
            cache_dir: ".cache".to_string(),
        }
    }
}

/// A named extraction pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Name used on the command line
    pub name: String,

    /// Key under which the extracted value is written
    #[serde(default = "default_field")]
    pub field: String,

    /// Selector fallbacks, tried in order
    pub candidates: Vec<SelectorCandidate>,
}

fn default_field() -> String {
    "title".to_string()
}

const BUILTIN_PIPELINES: [&str; 1] = ["nba"];

fn builtin_pipeline(name: &str) -> Option<PipelineConfig> {
    match name {
        "nba" => Some(PipelineConfig {
            name: "nba".to_string(),
            field: default_field(),
            candidates: vec![
                SelectorCandidate::new(SelectorStrategy::Css, "h1.headline"),
                SelectorCandidate::new(SelectorStrategy::Css, "header h1"),
                SelectorCandidate::new(
                    SelectorStrategy::Attr,
                    "meta[property='og:title']::content",
                ),
                SelectorCandidate::new(SelectorStrategy::Css, "title"),
            ],
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_nba_pipeline() {
        let config = Config::default();
        let pipeline = config.pipeline("nba").unwrap();
        assert_eq!(pipeline.field, "title");
        assert_eq!(pipeline.candidates.len(), 4);
        assert_eq!(pipeline.candidates[2].strategy, SelectorStrategy::Attr);
    }

    #[test]
    fn test_unknown_pipeline() {
        let config = Config::default();
        assert!(config.pipeline("nfl").is_none());
    }

    #[test]
    fn test_configured_pipeline_shadows_builtin() {
        let mut config = Config::default();
        config.pipelines.push(PipelineConfig {
            name: "nba".to_string(),
            field: "headline".to_string(),
            candidates: vec![SelectorCandidate::new(SelectorStrategy::Css, "h2")],
        });

        let pipeline = config.pipeline("nba").unwrap();
        assert_eq!(pipeline.field, "headline");
        assert_eq!(config.pipeline_names(), vec!["nba".to_string()]);
    }
}
