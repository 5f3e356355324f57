use super::{BackoffPolicy, CircuitBreaker, FetchError, FetchResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Pause taken when an attempt finds the circuit open
pub const DEFAULT_OPEN_PAUSE: Duration = Duration::from_secs(1);

/// Drives an operation through bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Circuit open | Fixed pause, attempt consumed, no call made |
/// | Success | Reset breaker, return immediately |
/// | HTTP 429/500/502/503/504 | Breaker failure, backoff + half-delay penalty |
/// | Any other failure | Breaker failure, backoff |
/// | Attempts exhausted | `RetryExhausted` wrapping the last failure |
///
/// Backoff after a failure is `min(delay, cap) + uniform(0, jitter)` plus
/// the penalty, after which `delay` grows by the multiplier. Nothing is
/// slept after the final attempt: neither the backoff sleep nor the
/// circuit-open pause.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: BackoffPolicy,
    breaker: Arc<CircuitBreaker>,
    open_pause: Duration,
}

impl RetryExecutor {
    pub fn new(policy: BackoffPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            policy,
            breaker,
            open_pause: DEFAULT_OPEN_PAUSE,
        }
    }

    /// Overrides the circuit-open pause
    pub fn with_open_pause(mut self, pause: Duration) -> Self {
        self.open_pause = pause;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> FetchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        let attempts = self.policy.attempts.max(1);
        let mut delay = self.policy.base.as_secs_f64();
        let mut last_error = None;

        for attempt in 1..=attempts {
            let is_last = attempt == attempts;

            if let Err(open) = self.breaker.check() {
                tracing::debug!(attempt, "Circuit open, pausing {:?}", self.open_pause);
                last_error = Some(open);
                if !is_last {
                    tokio::time::sleep(self.open_pause).await;
                }
                continue;
            }

            match operation().await {
                Ok(value) => {
                    self.breaker.on_success();
                    return Ok(value);
                }
                Err(error) => {
                    self.breaker.on_failure();

                    if !is_last {
                        let sleep =
                            self.policy
                                .sleep_for(delay, rand::random::<f64>(), error.is_penalized());
                        tracing::debug!(
                            attempt,
                            error = %error,
                            "Attempt failed, retrying in {:?}",
                            sleep
                        );
                        tokio::time::sleep(sleep).await;
                    }

                    delay *= self.policy.multiplier;
                    last_error = Some(error);
                }
            }
        }

        Err(FetchError::RetryExhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(FetchError::CircuitOpen)),
        })
    }
}
