use super::saturating_secs;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Longest sleep between two bucket checks while waiting for a token
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Token bucket state
#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiting the outbound request rate of a whole run
///
/// The bucket starts full. Tokens refill continuously at `rate` per second
/// up to `capacity`, and every request consumes one.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Creates a full bucket
    ///
    /// # Arguments
    ///
    /// * `rate_per_sec` - Refill rate; must be > 0 for waiters to make progress
    /// * `capacity` - Maximum burst size
    pub fn new(rate_per_sec: f64, capacity: u32) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            rate: rate_per_sec,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a token is available, then consumes it
    ///
    /// Never fails. Waiters are not queued: whichever task checks first
    /// after a refill gets the token.
    pub async fn acquire(&self) {
        loop {
            match self.take_or_wait() {
                None => return,
                Some(wait) => {
                    tracing::trace!("Rate limited, waiting {:?} for a token", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Consumes a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.take_or_wait().is_none()
    }

    /// Tokens currently in the bucket (after refilling for elapsed time)
    pub fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);
        bucket.tokens
    }

    /// Bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Takes a token, or reports how long to sleep before checking again
    fn take_or_wait(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return None;
        }

        let until_next = if self.rate > 0.0 {
            saturating_secs((1.0 - bucket.tokens) / self.rate)
        } else {
            POLL_INTERVAL
        };
        Some(until_next.clamp(Duration::from_millis(1), POLL_INTERVAL))
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.rate).min(self.capacity);
        bucket.last_refill = now;
    }
}
