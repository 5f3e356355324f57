use super::saturating_secs;
use crate::config::BackoffConfig;
use std::time::Duration;

/// Retry timing shared read-only by every fetch of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (circuit-open pauses included)
    pub attempts: u32,

    /// First delay
    pub base: Duration,

    /// Upper bound on the exponential part of a delay
    pub cap: Duration,

    /// Upper bound of the uniform jitter added to each delay
    pub jitter: Duration,

    /// Growth factor applied after each failure
    pub multiplier: f64,
}

impl BackoffPolicy {
    /// Exponential delays before jitter and penalties:
    /// `base, base*mult, base*mult^2, ...`, each capped at `cap`
    ///
    /// Yields one delay per attempt.
    pub fn nominal_delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let cap = self.cap.as_secs_f64();
        std::iter::successors(Some(self.base.as_secs_f64()), move |d| {
            Some(d * self.multiplier)
        })
        .take(self.attempts as usize)
        .map(move |d| saturating_secs(d.min(cap)))
    }

    /// Sleep taken after a failed attempt
    ///
    /// `current` is the uncapped exponential delay for this attempt and
    /// `jitter_sample` a uniform draw in `[0, 1)`. Penalized failures add half
    /// of the uncapped delay on top, so the result saturates rather than
    /// overflowing for very long schedules.
    pub fn sleep_for(&self, current: f64, jitter_sample: f64, penalized: bool) -> Duration {
        let penalty = if penalized { 0.5 * current } else { 0.0 };
        let secs = current.min(self.cap.as_secs_f64())
            + jitter_sample * self.jitter.as_secs_f64()
            + penalty;
        saturating_secs(secs)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            base: saturating_secs(config.base_secs),
            cap: saturating_secs(config.cap_secs),
            jitter: saturating_secs(config.jitter_secs),
            multiplier: config.multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            attempts: 6,
            base: Duration::from_millis(400),
            cap: Duration::from_secs(8),
            jitter: Duration::from_millis(400),
            multiplier: 2.0,
        }
    }

    fn millis(delays: impl Iterator<Item = Duration>) -> Vec<u128> {
        delays.map(|d| d.as_millis()).collect()
    }

    #[test]
    fn test_default_matches_stock_config() {
        assert_eq!(BackoffPolicy::default(), policy());
    }

    #[test]
    fn test_nominal_delays_grow_exponentially() {
        assert_eq!(
            millis(policy().nominal_delays()),
            vec![400, 800, 1600, 3200, 6400, 8000]
        );
    }

    #[test]
    fn test_nominal_delays_are_capped() {
        let policy = BackoffPolicy {
            attempts: 5,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(5),
            multiplier: 3.0,
            ..policy()
        };
        assert_eq!(millis(policy.nominal_delays()), vec![1000, 3000, 5000, 5000, 5000]);
    }

    #[test]
    fn test_sleep_without_jitter_or_penalty() {
        let policy = policy();
        assert_eq!(policy.sleep_for(0.4, 0.0, false), Duration::from_millis(400));
        assert_eq!(policy.sleep_for(12.8, 0.0, false), Duration::from_secs(8));
    }

    #[test]
    fn test_sleep_with_jitter() {
        let sleep = policy().sleep_for(0.4, 0.5, false);
        assert_eq!(sleep, Duration::from_millis(600));
    }

    #[test]
    fn test_penalty_uses_uncapped_delay() {
        let policy = policy();
        assert_eq!(policy.sleep_for(0.8, 0.0, true), Duration::from_millis(1200));
        // cap applies to the exponential part only
        assert_eq!(policy.sleep_for(16.0, 0.0, true), Duration::from_secs(16));
    }

    #[test]
    fn test_out_of_range_config_saturates() {
        let config = BackoffConfig {
            cap_secs: 1e20,
            jitter_secs: -1.0,
            ..BackoffConfig::default()
        };
        let policy = BackoffPolicy::from(&config);
        assert_eq!(policy.cap, Duration::MAX);
        assert_eq!(policy.jitter, Duration::ZERO);
    }

    #[test]
    fn test_huge_penalty_saturates() {
        assert_eq!(policy().sleep_for(1e30, 0.0, true), Duration::MAX);
    }
}
