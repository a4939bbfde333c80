//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all quote pipeline operations
//! - [`ProtocolErrorKind`]: Why a single response line could not be framed
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Reasons a single line of the quote protocol was rejected by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// The line does not start with the `v_s_` variable prefix.
    #[error("missing v_s_ prefix")]
    MissingPrefix,

    /// No `=` separates the variable name from its payload.
    #[error("missing assignment")]
    MissingAssignment,

    /// The variable name carries no symbol, or the symbol has illegal characters.
    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),

    /// The payload is not wrapped in double quotes and terminated by `;`.
    #[error("malformed payload framing")]
    MalformedPayload,

    /// The payload split into fewer fields than the protocol requires.
    #[error("insufficient fields: expected {expected}, found {found}")]
    InsufficientFields {
        /// Number of fields the protocol requires
        expected: usize,
        /// Number of fields actually present
        found: usize,
    },

    /// The symbol already appeared earlier in the same response.
    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(String),
}

/// Errors that can occur while fetching and normalizing quotes.
///
/// Only [`UnknownSymbol`](Self::UnknownSymbol) and [`Client`](Self::Client)
/// ever cross the [`QuoteService`](crate::QuoteService) boundary. Everything
/// else is recorded as diagnostics on the returned envelope.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request to the upstream did not complete within the configured timeout.
    #[error("Timeout: {provider} after {timeout_ms} ms")]
    Timeout {
        /// The source that timed out
        provider: String,
        /// The timeout that was exceeded
        timeout_ms: u64,
    },

    /// The connection to the upstream failed before a response arrived.
    #[error("Connection failed: {provider} - {message}")]
    Connection {
        /// The source that failed
        provider: String,
        /// The transport error message
        message: String,
    },

    /// The upstream answered with a non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    HttpStatus {
        /// The source that answered
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The upstream answered successfully but without any content.
    #[error("Empty response body from {provider}")]
    EmptyBody {
        /// The source that answered
        provider: String,
    },

    /// Every attempt failed; carries the last failure.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts that were made
        attempts: u32,
        /// The error returned by the final attempt
        last_error: Box<MarketDataError>,
    },

    /// A response line could not be parsed.
    #[error("Protocol error on line {line}: {kind}")]
    Protocol {
        /// 1-based line number inside the response body
        line: usize,
        /// Why the line was rejected
        kind: ProtocolErrorKind,
    },

    /// A normalized quote violated a domain invariant.
    #[error("Validation failed for {symbol}: {message}")]
    ValidationFailed {
        /// The symbol of the rejected quote
        symbol: String,
        /// Description of the violations
        message: String,
    },

    /// Text could not be decoded or repaired.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A specific symbol produced no quote, not even a synthetic one.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::WithBackoff`]: transient transport failure, retry after a delay
    /// - [`RetryClass::Never`]: retrying the same request cannot help
    ///
    /// # Examples
    ///
    /// ```
    /// use quoteboard_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::EmptyBody { provider: "GTIMG".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::UnknownSymbol("sh999999".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. }
            | Self::Connection { .. }
            | Self::HttpStatus { .. }
            | Self::EmptyBody { .. } => RetryClass::WithBackoff,

            Self::RetriesExhausted { .. }
            | Self::Protocol { .. }
            | Self::ValidationFailed { .. }
            | Self::Encoding(_)
            | Self::UnknownSymbol(_)
            | Self::Client(_) => RetryClass::Never,
        }
    }

    /// Whether this is a transport-level failure of the upstream.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Connection { .. }
                | Self::HttpStatus { .. }
                | Self::EmptyBody { .. }
                | Self::RetriesExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failures_retry_with_backoff() {
        let errors = [
            MarketDataError::Timeout {
                provider: "GTIMG".to_string(),
                timeout_ms: 8000,
            },
            MarketDataError::Connection {
                provider: "GTIMG".to_string(),
                message: "connection refused".to_string(),
            },
            MarketDataError::HttpStatus {
                provider: "GTIMG".to_string(),
                status: 502,
            },
            MarketDataError::EmptyBody {
                provider: "GTIMG".to_string(),
            },
        ];

        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::WithBackoff);
            assert!(error.is_network());
        }
    }

    #[test]
    fn test_exhausted_never_retries() {
        let error = MarketDataError::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(MarketDataError::EmptyBody {
                provider: "GTIMG".to_string(),
            }),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert!(error.is_network());
    }

    #[test]
    fn test_data_errors_never_retry() {
        let error = MarketDataError::Protocol {
            line: 2,
            kind: ProtocolErrorKind::MissingPrefix,
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert!(!error.is_network());

        let error = MarketDataError::UnknownSymbol("sh999999".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::Protocol {
            line: 3,
            kind: ProtocolErrorKind::InsufficientFields {
                expected: 11,
                found: 2,
            },
        };
        assert_eq!(
            format!("{}", error),
            "Protocol error on line 3: insufficient fields: expected 11, found 2"
        );

        let error = MarketDataError::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(MarketDataError::HttpStatus {
                provider: "GTIMG".to_string(),
                status: 503,
            }),
        };
        assert_eq!(
            format!("{}", error),
            "Retries exhausted after 4 attempts: HTTP 503 from GTIMG"
        );
    }
}
