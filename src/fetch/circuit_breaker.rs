//! Circuit breaker for a failing upstream.
//!
//! Opens after `fail_threshold` failures without an intervening success and
//! fails fast until the cooldown expires. There is no half-open probe state:
//! the first check after the cooldown is an ordinary closed-state check, and
//! since the failure count is only reset by a success, one more failure
//! reopens the circuit straight away.

use super::{saturating_secs, FetchError, FetchResult};
use crate::config::BreakerConfig;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Stand-in for an unbounded cooldown (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Failing fast until the cooldown expires
    Open,
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    open_until: Option<Instant>,
}

/// Failure-count/cooldown gate shared by every fetch of a run
#[derive(Debug)]
pub struct CircuitBreaker {
    fail_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(fail_threshold: u32, cooldown: Duration) -> Self {
        Self {
            fail_threshold: fail_threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Fails with [`FetchError::CircuitOpen`] while the cooldown is running
    pub fn check(&self) -> FetchResult<()> {
        match self.state() {
            CircuitState::Open => Err(FetchError::CircuitOpen),
            CircuitState::Closed => Ok(()),
        }
    }

    /// Resets the failure count and closes the circuit
    pub fn on_success(&self) {
        let mut state = self.lock();
        if state.open_until.take().is_some() || state.failures > 0 {
            tracing::debug!("Circuit breaker: reset after success");
        }
        state.failures = 0;
    }

    /// Counts a failure, opening the circuit once the threshold is reached
    pub fn on_failure(&self) {
        let mut state = self.lock();
        state.failures = state.failures.saturating_add(1);

        if state.failures >= self.fail_threshold {
            let now = Instant::now();
            let until = now
                .checked_add(self.cooldown)
                .unwrap_or_else(|| now + FAR_FUTURE);
            state.open_until = Some(until);
            tracing::warn!(
                "Circuit breaker: OPEN after {} failures, cooling down for {:?}",
                state.failures,
                self.cooldown
            );
        }
    }

    /// Current state; Open iff now is before the stored open-until instant
    pub fn state(&self) -> CircuitState {
        match self.lock().open_until {
            Some(until) if Instant::now() < until => CircuitState::Open,
            _ => CircuitState::Closed,
        }
    }

    /// Failures recorded since the last success
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&BreakerConfig> for CircuitBreaker {
    fn from(config: &BreakerConfig) -> Self {
        Self::new(
            config.fail_threshold,
            saturating_secs(config.cooldown_secs),
        )
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}
