//! Market data models
//!
//! This module contains the core data types of the quote pipeline:
//! - `index` - Static index registry (IndexConfig, IndexRegistry) and MarketId
//! - `raw` - Fixed-arity raw protocol fields (RawFieldSet)
//! - `quote` - Normalized quotes (QuoteRecord, Trend, QuoteDisplay)
//! - `envelope` - Consumer envelope, diagnostics and service statistics
//! - `report` - Market overview and self-test reports

mod envelope;
mod index;
mod quote;
mod raw;
mod report;

pub use envelope::{
    Diagnostics, LineError, QuoteEnvelope, QuoteMap, RejectedQuote, ServiceStats,
};
pub use index::{IndexConfig, IndexRegistry, MarketId, SHANGHAI_MARKER};
pub use quote::{QuoteDisplay, QuoteRecord, Trend};
pub use raw::{RawFieldSet, RAW_FIELD_COUNT};
pub use report::{CheckResult, DataSourceReport, MarketOverview};
