//! Quote source trait definition.
//!
//! A `QuoteSource` performs exactly one upstream attempt. Timeouts, retries
//! and rate limiting are layered on top by the registry, so implementations
//! stay small and stub sources can stand in for the network in tests.

use async_trait::async_trait;

use crate::errors::MarketDataError;

/// Trait for upstream quote sources.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quoteboard_market_data::provider::QuoteSource;
///
/// struct FixedSource(String);
///
/// #[async_trait]
/// impl QuoteSource for FixedSource {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch_raw(&self, _symbols: &[String]) -> Result<String, MarketDataError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Unique identifier for this source, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch the raw protocol body for one or more symbols in a single request.
    ///
    /// # Arguments
    ///
    /// * `symbols` - Upstream symbols without the `s_` request prefix
    ///
    /// # Returns
    ///
    /// The decoded response body. Implementations report timeouts,
    /// connection failures, non-success statuses and empty bodies as the
    /// matching [`MarketDataError`] network variants.
    async fn fetch_raw(&self, symbols: &[String]) -> Result<String, MarketDataError>;
}
