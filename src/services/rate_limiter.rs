use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::MIN_REQUEST_INTERVAL_MS;
use crate::errors::RateLimitExceeded;

/// Minimum-spacing gate for outbound catalog calls.
///
/// Only the time of the last *permitted* call is kept; a rejected call leaves
/// it untouched. There is no queueing: callers treat rejection as failure.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_permitted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_permitted: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn try_acquire(&self) -> Result<(), RateLimitExceeded> {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut last = self.last_permitted.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(prev) = *last {
            let elapsed = now.saturating_duration_since(prev);
            if elapsed < self.min_interval {
                let retry_after = self.min_interval - elapsed;
                tracing::debug!(?retry_after, "rate limit permit rejected");
                return Err(RateLimitExceeded { retry_after });
            }
        }

        *last = Some(now);
        Ok(())
    }

    pub fn last_permitted(&self) -> Option<Instant> {
        *self.last_permitted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(MIN_REQUEST_INTERVAL_MS))
    }
}
