//! Upstream quote sources.
//!
//! This module contains:
//! - The `QuoteSource` trait that all sources implement (one attempt per call)
//! - The HTTP source for the legacy tilde-delimited endpoint
//!
//! Retry, timeout enforcement and rate limiting live in the registry module,
//! not in the sources themselves.

mod traits;

pub mod gtimg;

pub use traits::QuoteSource;
