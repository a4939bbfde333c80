//! Quoteboard Market Data Crate
//!
//! Real-time quotes for mainland-China stock indices, fetched from a legacy
//! tilde-delimited plain-text endpoint and served to dashboard widgets.
//!
//! # Overview
//!
//! The crate supports:
//! - Batched upstream requests with a shared minimum-interval rate limit
//! - Per-attempt timeouts and bounded retries with linear backoff
//! - Line-isolated parsing: one malformed line never poisons a batch
//! - Text repair for GBK/mis-decoded index names
//! - Validation of every record before it is handed out
//! - Clearly flagged synthetic data when the upstream stays down
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteService   |  (single, batch, all indices, overview, self-test)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |   RateLimiter    | --> |  UpstreamClient  |  (timeout + retries)
//! +------------------+     +------------------+
//!                                  |
//!                 +----------------+----------------+
//!                 | ok                              | exhausted
//!                 v                                 v
//!         +------------------+             +-------------------+
//!         |  parse_response  |             | FallbackGenerator |
//!         +------------------+             +-------------------+
//!                 |                                 |
//!                 v                                 |
//!         +------------------+                      |
//!         | FieldNormalizer  |                      |
//!         +------------------+                      |
//!                 |                                 |
//!                 +----------------+----------------+
//!                                  v
//!                          +------------------+
//!                          |  QuoteValidator  |
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  QuoteEnvelope   |
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`QuoteService`] - Facade owning the pipeline and its counters
//! - [`QuoteRecord`] - Normalized, validated index quote
//! - [`QuoteEnvelope`] - Response wrapper with success flag and mock marker
//! - [`IndexRegistry`] - Known indices, their markets and fallback base prices
//! - [`QuoteSource`] - Single-attempt upstream transport

pub mod config;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod service;

pub use config::{QuoteServiceConfig, DEFAULT_BASE_URL};

pub use errors::{MarketDataError, ProtocolErrorKind, RetryClass};

pub use models::{
    CheckResult, DataSourceReport, Diagnostics, IndexConfig, IndexRegistry, LineError, MarketId,
    MarketOverview, QuoteDisplay, QuoteEnvelope, QuoteMap, QuoteRecord, RawFieldSet,
    RejectedQuote, ServiceStats, Trend,
};

pub use protocol::{parse_response, FieldNormalizer, ParsedResponse};

pub use provider::gtimg::GtimgQuoteSource;
pub use provider::QuoteSource;

pub use registry::{
    FallbackGenerator, QuoteValidator, RateLimitConfig, RateLimiter, RetryPolicy, UpstreamClient,
    ValidatorConfig,
};

pub use service::QuoteService;
