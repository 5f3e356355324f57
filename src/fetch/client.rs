//! HTTP fetch client
//!
//! One logical fetch is: take a token from the shared rate limiter, then run
//! a GET through the retry executor (and with it the shared circuit breaker).
//! The underlying `reqwest::Client` is the transport session for the whole
//! run; its connection pool is released when the `FetchClient` is dropped.

use super::{
    saturating_secs, BackoffPolicy, CircuitBreaker, FetchError, FetchResult, RateLimiter,
    RetryExecutor,
};
use crate::config::{Config, FetchConfig};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;

/// Builds the transport session with fixed timeouts
///
/// # Arguments
///
/// * `config` - Transport settings (User-Agent, timeouts, redirect limit)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use scrape_guardrails::config::FetchConfig;
/// use scrape_guardrails::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.total_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, retried, circuit-protected document fetcher
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    limiter: Arc<RateLimiter>,
    retry: RetryExecutor,
}

impl FetchClient {
    pub fn new(client: Client, limiter: Arc<RateLimiter>, retry: RetryExecutor) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// Builds a client with a fresh rate limiter and circuit breaker
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.fetch)?;
        let limiter = Arc::new(RateLimiter::new(config.fetch.rate_per_sec, config.fetch.burst));
        let breaker = Arc::new(CircuitBreaker::from(&config.breaker));
        let retry = RetryExecutor::new(BackoffPolicy::from(&config.backoff), breaker)
            .with_open_pause(saturating_secs(config.breaker.open_pause_secs));

        Ok(Self::new(client, limiter, retry))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        self.retry.breaker()
    }

    /// Fetches `url` and returns the response body as text
    ///
    /// Waits for a rate-limiter token first. Statuses >= 400 are failures
    /// carrying the numeric status; redirects are followed. Returns the
    /// terminal `RetryExhausted` error once every attempt has failed.
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.limiter.acquire().await;

        let client = &self.client;
        self.retry.run(move || get_text(client, url)).await
    }
}

/// One GET attempt
async fn get_text(client: &Client, url: &str) -> FetchResult<String> {
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();

    if status.as_u16() >= 400 {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    response.text().await.map_err(transport)
}
