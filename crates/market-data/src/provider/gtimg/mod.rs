//! HTTP source for the legacy tilde-delimited quote endpoint.
//!
//! Request: `GET <base>?q=s_<sym1>,s_<sym2>,...`
//! Response: `text/plain`, one `v_s_<SYMBOL>="...";` line per symbol,
//! usually GBK-encoded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::protocol::encoding::{charset_from_content_type, decode_body};
use crate::provider::QuoteSource;

const PROVIDER_ID: &str = "GTIMG";

/// Prefix the endpoint expects in front of every requested symbol.
const SYMBOL_PREFIX: &str = "s_";

/// Build the request URL for a batch of symbols.
///
/// Symbols are comma-joined verbatim; the endpoint does not accept an
/// encoded comma.
pub fn build_request_url(base_url: &str, symbols: &[String]) -> String {
    let list = symbols
        .iter()
        .map(|symbol| format!("{}{}", SYMBOL_PREFIX, symbol))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}?q={}", base_url, list)
}

/// Quote source backed by the provider's plain-text HTTP endpoint.
pub struct GtimgQuoteSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl GtimgQuoteSource {
    /// Create a new source with the given endpoint and per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            MarketDataError::Connection {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl QuoteSource for GtimgQuoteSource {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_raw(&self, symbols: &[String]) -> Result<String, MarketDataError> {
        let url = build_request_url(&self.base_url, symbols);
        debug!("GTIMG request for {} symbols", symbols.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GTIMG answered HTTP {}", status);
            return Err(MarketDataError::HttpStatus {
                provider: PROVIDER_ID.to_string(),
                status: status.as_u16(),
            });
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type)
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let body = decode_body(&bytes, charset.as_deref());

        if body.trim().is_empty() {
            return Err(MarketDataError::EmptyBody {
                provider: PROVIDER_ID.to_string(),
            });
        }

        Ok(body)
    }
}
