//! Service configuration.
//!
//! All tunables of the quote pipeline live here and are passed to
//! [`QuoteService`](crate::QuoteService) at construction time.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;

/// Default upstream endpoint serving the tilde-delimited quote protocol.
pub const DEFAULT_BASE_URL: &str = "https://qt.gtimg.cn/";

/// Default hard timeout for a single upstream attempt.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Default number of additional attempts after the first one fails.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay; attempt `n` waits `n * base` before retrying.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default minimum spacing between two upstream requests.
const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Quote service configuration.
#[derive(Clone, Debug)]
pub struct QuoteServiceConfig {
    /// Base endpoint; the symbol list is appended as the `q` query parameter.
    pub base_url: String,
    /// Hard timeout for each upstream attempt.
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base retry delay, multiplied by the attempt number.
    pub retry_delay: Duration,
    /// Minimum spacing between upstream requests across the whole service.
    pub min_request_interval: Duration,
    /// Number of registry symbols sampled by the data-quality self-test.
    pub quality_sample_size: usize,
    /// Minimum field completeness ratio for the data-quality self-test to pass.
    pub quality_threshold: f64,
    /// Wall-clock budget for a full registry fetch in the performance self-test.
    pub performance_budget: Duration,
    /// Per-symbol base prices for synthetic quotes, overriding the registry.
    pub fallback_base_prices: HashMap<String, Decimal>,
}

impl Default for QuoteServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            quality_sample_size: 3,
            quality_threshold: 0.8,
            performance_budget: Duration::from_secs(10),
            fallback_base_prices: HashMap::new(),
        }
    }
}
