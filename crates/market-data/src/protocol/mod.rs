//! The legacy tilde-delimited quote protocol.
//!
//! - `parser` - Line framing and field splitting, with per-line error isolation
//! - `normalizer` - Typed records from raw fields
//! - `encoding` - Body decoding and name repair
//! - `display` - Pre-formatted strings for widgets

pub mod display;
pub mod encoding;
pub mod normalizer;
pub mod parser;

pub use normalizer::{FieldNormalizer, QuoteFields, UNKNOWN_INDEX_NAME};
pub use parser::{parse_response, tokenize_line, ParsedResponse};
