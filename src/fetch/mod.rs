//! Resilient fetch engine
//!
//! This module contains the fault-tolerance backbone shared by every fetch in
//! a run:
//! - `BackoffPolicy`: immutable retry timing
//! - `RateLimiter`: token bucket throttling the outbound request rate
//! - `CircuitBreaker`: failure-count/cooldown gate for a failing upstream
//! - `RetryExecutor`: bounded retries with exponential backoff and jitter
//! - `FetchClient`: one logical fetch through all of the above

mod backoff;
mod circuit_breaker;
mod client;
mod rate_limiter;
mod retry;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::{build_http_client, FetchClient};
pub use rate_limiter::RateLimiter;
pub use retry::RetryExecutor;

use std::time::Duration;
use thiserror::Error;

/// HTTP statuses that earn an extra backoff penalty
pub const PENALIZED_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors raised while fetching a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Circuit open: temporarily backing off")]
    CircuitOpen,

    #[error("http {status} {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// The HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RetryExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// True for upstream overload/outage statuses that warrant a longer wait
    pub fn is_penalized(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if PENALIZED_STATUSES.contains(status))
    }

    /// True once the retry budget is spent
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Converts seconds to a `Duration`, saturating instead of panicking
///
/// Negative and NaN inputs give zero; values past `Duration::MAX` give
/// `Duration::MAX`.
pub(crate) fn saturating_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
