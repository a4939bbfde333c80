//! Upstream client: one logical request, bounded sequential retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::provider::QuoteSource;

/// Retry policy for upstream requests.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay; retry `n` waits `n * retry_delay`.
    pub retry_delay: Duration,
    /// Hard timeout for each attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

/// A successful upstream response.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub body: String,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// Issues batched requests through a [`QuoteSource`] with timeout and retry.
///
/// Never decides on fallback data; exhausted retries are reported as
/// [`MarketDataError::RetriesExhausted`] for the caller to act on.
pub struct UpstreamClient {
    source: Arc<dyn QuoteSource>,
    policy: RetryPolicy,
    /// Attempts made over the client's lifetime, retries included.
    attempts: AtomicU64,
}

impl UpstreamClient {
    pub fn new(source: Arc<dyn QuoteSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source_id(&self) -> &'static str {
        self.source.id()
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Fetch the raw body for `symbols` in a single batched request.
    pub async fn fetch(&self, symbols: &[String]) -> Result<UpstreamResponse, MarketDataError> {
        let max_attempts = self.policy.max_retries + 1;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.attempts.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Requesting {} symbols from '{}' (attempt {}/{})",
                symbols.len(),
                self.source.id(),
                attempt,
                max_attempts
            );

            let error = match self.attempt(symbols).await {
                Ok(body) => {
                    if attempt > 1 {
                        info!(
                            "'{}' succeeded on attempt {}/{}",
                            self.source.id(),
                            attempt,
                            max_attempts
                        );
                    }
                    return Ok(UpstreamResponse {
                        body,
                        attempts: attempt,
                    });
                }
                Err(e) => e,
            };

            if error.retry_class() == RetryClass::Never {
                warn!("'{}' failed with {}, not retrying", self.source.id(), error);
                return Err(MarketDataError::RetriesExhausted {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            }

            if attempt >= max_attempts {
                warn!(
                    "'{}' failed after {} attempts: {}",
                    self.source.id(),
                    attempt,
                    error
                );
                return Err(MarketDataError::RetriesExhausted {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "'{}' attempt {}/{} failed: {}; retrying in {:?}",
                self.source.id(),
                attempt,
                max_attempts,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One attempt, bounded by the policy timeout; empty bodies count as failures.
    async fn attempt(&self, symbols: &[String]) -> Result<String, MarketDataError> {
        let body = tokio::time::timeout(self.policy.timeout, self.source.fetch_raw(symbols))
            .await
            .map_err(|_| MarketDataError::Timeout {
                provider: self.source.id().to_string(),
                timeout_ms: self.policy.timeout.as_millis() as u64,
            })??;

        if body.trim().is_empty() {
            return Err(MarketDataError::EmptyBody {
                provider: self.source.id().to_string(),
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Fails the first `failures` calls, then answers with `body`.
    struct FlakySource {
        failures: usize,
        body: String,
        call_count: AtomicUsize,
    }

    impl FlakySource {
        fn new(failures: usize, body: &str) -> Self {
            Self {
                failures,
                body: body.to_string(),
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FlakySource {
        fn id(&self) -> &'static str {
            "FLAKY"
        }

        async fn fetch_raw(&self, _symbols: &[String]) -> Result<String, MarketDataError> {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(MarketDataError::Connection {
                    provider: "FLAKY".to_string(),
                    message: format!("refused #{}", call + 1),
                })
            } else {
                Ok(format!("{} #{}", self.body, call + 1))
            }
        }
    }

    struct SlowSource;

    #[async_trait]
    impl QuoteSource for SlowSource {
        fn id(&self) -> &'static str {
            "SLOW"
        }

        async fn fetch_raw(&self, _symbols: &[String]) -> Result<String, MarketDataError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            retry_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    fn symbols() -> Vec<String> {
        vec!["sh000001".to_string()]
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let source = Arc::new(FlakySource::new(2, "ok"));
        let client = UpstreamClient::new(source.clone(), fast_policy(3));

        let response = client.fetch(&symbols()).await.unwrap();

        assert_eq!(response.attempts, 3);
        assert_eq!(response.body, "ok #3");
        assert_eq!(source.call_count.load(Ordering::SeqCst), 3);
        assert_eq!(client.total_attempts(), 3);
    }

    #[tokio::test]
    async fn test_always_failing_makes_max_retries_plus_one_attempts() {
        let source = Arc::new(FlakySource::new(usize::MAX, "never"));
        let client = UpstreamClient::new(source.clone(), fast_policy(3));

        let error = client.fetch(&symbols()).await.unwrap_err();

        assert_eq!(source.call_count.load(Ordering::SeqCst), 4);
        match error {
            MarketDataError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last_error, MarketDataError::Connection { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_retried() {
        struct BlankSource(AtomicUsize);

        #[async_trait]
        impl QuoteSource for BlankSource {
            fn id(&self) -> &'static str {
                "BLANK"
            }

            async fn fetch_raw(&self, _symbols: &[String]) -> Result<String, MarketDataError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok("  \n".to_string())
            }
        }

        let blank = Arc::new(BlankSource(AtomicUsize::new(0)));
        let client = UpstreamClient::new(blank.clone(), fast_policy(2));
        let error = client.fetch(&symbols()).await.unwrap_err();

        assert_eq!(blank.0.load(Ordering::SeqCst), 3);
        assert!(matches!(
            error,
            MarketDataError::RetriesExhausted { last_error, .. }
                if matches!(*last_error, MarketDataError::EmptyBody { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_feeds_retry_policy() {
        let client = UpstreamClient::new(Arc::new(SlowSource), fast_policy(1));

        let error = client.fetch(&symbols()).await.unwrap_err();

        assert_eq!(client.total_attempts(), 2);
        assert!(matches!(
            error,
            MarketDataError::RetriesExhausted { attempts: 2, last_error }
                if matches!(*last_error, MarketDataError::Timeout { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_between_attempts() {
        let source = Arc::new(FlakySource::new(2, "ok"));
        let policy = RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
        };
        let client = UpstreamClient::new(source, policy);

        let started = tokio::time::Instant::now();
        let response = client.fetch(&symbols()).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.attempts, 3);
        // 100 ms after the first failure, 200 ms after the second
        assert!(elapsed >= Duration::from_millis(300), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "{:?}", elapsed);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
    }
}
