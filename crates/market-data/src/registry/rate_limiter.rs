//! Minimum-interval rate limiter for upstream requests.
//!
//! One limiter is shared by everything a service instance sends upstream.
//! Spacing is measured from the actual previous acquisition, so callers in
//! a tight loop never drift below the interval.

use std::time::{Duration, Instant};

use log::debug;
use tokio::sync::Mutex;

/// Default minimum spacing between two requests.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Rate limiter configuration.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Minimum time between two acquisitions.
    pub min_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

/// Shared request gate.
///
/// The lock is held while a caller waits, so concurrent callers are
/// serialized and each one gets its own full interval.
pub struct RateLimiter {
    /// When the last slot was handed out.
    last_acquired: Mutex<Option<Instant>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a rate limiter with custom configuration.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            last_acquired: Mutex::new(None),
            config,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.config.min_interval
    }

    /// Wait (asynchronously) until a request may be sent, then claim the slot.
    pub async fn acquire(&self) {
        let mut last = self.last_acquired.lock().await;

        let wait_time = Self::remaining(*last, self.config.min_interval);
        if wait_time > Duration::ZERO {
            debug!("Rate limiter: waiting {:?}", wait_time);
            tokio::time::sleep(wait_time).await;
        }

        *last = Some(Instant::now());
    }

    /// Claim the slot only if no waiting is needed.
    ///
    /// Returns false when rate limited or when another caller holds the gate.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut last) = self.last_acquired.try_lock() else {
            return false;
        };

        if Self::remaining(*last, self.config.min_interval) > Duration::ZERO {
            return false;
        }

        *last = Some(Instant::now());
        true
    }

    /// How long an `acquire` issued now would wait, ignoring other waiters.
    pub async fn time_until_available(&self) -> Duration {
        let last = self.last_acquired.lock().await;
        Self::remaining(*last, self.config.min_interval)
    }

    /// Forget the previous acquisition.
    pub async fn reset(&self) {
        *self.last_acquired.lock().await = None;
    }

    fn remaining(last: Option<Instant>, min_interval: Duration) -> Duration {
        match last {
            Some(at) => min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(ms: u64) -> RateLimiter {
        RateLimiter::with_config(RateLimitConfig {
            min_interval: Duration::from_millis(ms),
        })
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = limiter(500);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = limiter(60);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_tight_loop_does_not_drift() {
        let limiter = limiter(30);
        let start = Instant::now();

        for _ in 0..4 {
            limiter.acquire().await;
        }

        // First acquire is free, the next three each wait a full interval.
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_try_acquire() {
        let limiter = limiter(10_000);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert!(limiter.time_until_available().await > Duration::ZERO);

        limiter.reset().await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_shared_limiter_serializes_callers() {
        let limiter = Arc::new(limiter(40));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(RateLimiter::new().min_interval(), Duration::from_millis(1000));
    }
}
