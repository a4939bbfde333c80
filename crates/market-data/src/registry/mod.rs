//! Request orchestration.
//!
//! This module provides everything between a symbol list and a validated batch:
//! - Rate limiting shared by the whole service instance
//! - Upstream requests with timeout and bounded retries
//! - Quote data validation
//! - Synthetic fallback quotes when the upstream stays down

mod fallback;
mod rate_limiter;
mod upstream;
mod validator;

pub use fallback::FallbackGenerator;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use upstream::{RetryPolicy, UpstreamClient, UpstreamResponse};
pub use validator::{
    QuoteValidator, ValidationIssue, ValidationResult, ValidationSeverity, ValidatorConfig,
};
