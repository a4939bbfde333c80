use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::quote::QuoteRecord;
use crate::errors::{MarketDataError, ProtocolErrorKind};

/// Symbol-keyed quotes, as returned by single and batch lookups.
pub type QuoteMap = BTreeMap<String, QuoteRecord>;

/// A response line the parser could not turn into a raw field set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number inside the response body
    pub line_number: usize,
    /// Symbol, when the line framed far enough to reveal it
    pub symbol: Option<String>,
    /// The offending line, trimmed
    pub line: String,
    pub kind: ProtocolErrorKind,
}

impl LineError {
    pub fn to_error(&self) -> MarketDataError {
        MarketDataError::Protocol {
            line: self.line_number,
            kind: self.kind.clone(),
        }
    }
}

/// A normalized quote that failed validation.
#[derive(Clone, Debug)]
pub struct RejectedQuote {
    pub symbol: String,
    pub errors: Vec<String>,
}

impl RejectedQuote {
    /// Hard violations joined into one error.
    pub fn to_error(&self) -> MarketDataError {
        MarketDataError::ValidationFailed {
            symbol: self.symbol.clone(),
            message: self.errors.join("; "),
        }
    }
}

/// Per-request trace of everything that did not make it into `data`.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    /// Lines the parser skipped
    pub line_errors: Vec<LineError>,
    /// Records the validator excluded
    pub rejected: Vec<RejectedQuote>,
    /// Final upstream failure when fallback data was served
    pub upstream_error: Option<String>,
    /// Upstream attempts spent on this request
    pub attempts: u32,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.line_errors.is_empty() && self.rejected.is_empty() && self.upstream_error.is_none()
    }

    /// Skipped lines followed by rejected records, as typed errors.
    pub fn errors(&self) -> Vec<MarketDataError> {
        self.line_errors
            .iter()
            .map(LineError::to_error)
            .chain(self.rejected.iter().map(RejectedQuote::to_error))
            .collect()
    }
}

/// Envelope handed to dashboard consumers.
///
/// Serializes as `{success, data, message, timestamp, requestCount?, is_mock_data?}`.
/// Diagnostics stay in-process and are never serialized.
#[derive(Clone, Debug, Serialize)]
pub struct QuoteEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "requestCount", skip_serializing_if = "Option::is_none")]
    pub request_count: Option<u64>,
    /// Set to `Some(true)` whenever `data` was synthesized locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock_data: Option<bool>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl<T> QuoteEnvelope<T> {
    pub fn is_mock(&self) -> bool {
        self.is_mock_data.unwrap_or(false)
    }

    /// Re-wrap the payload, keeping every other field.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QuoteEnvelope<U> {
        QuoteEnvelope {
            success: self.success,
            data: f(self.data),
            message: self.message,
            timestamp: self.timestamp,
            request_count: self.request_count,
            is_mock_data: self.is_mock_data,
            diagnostics: self.diagnostics,
        }
    }
}

/// Cumulative usage of one service instance plus its configured tunables.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Logical upstream requests dispatched
    pub request_count: u64,
    /// HTTP attempts including retries
    pub upstream_attempts: u64,
    /// Requests answered with synthetic data
    pub fallback_count: u64,
    pub last_request_at: Option<DateTime<Utc>>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
    pub min_request_interval_ms: u64,
}
