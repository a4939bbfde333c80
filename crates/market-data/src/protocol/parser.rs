//! Tokenizer for the tilde-delimited quote protocol.
//!
//! Each index occupies one line of the form
//!
//! ```text
//! v_s_<SYMBOL>="<f0>~<f1>~...~<f10>";
//! ```
//!
//! Lines are framed independently: a malformed line is recorded and skipped
//! without affecting the rest of the body.

use std::collections::BTreeMap;

use log::debug;

use crate::errors::ProtocolErrorKind;
use crate::models::{LineError, RawFieldSet};

/// Variable-name prefix of every quote line.
const LINE_PREFIX: &str = "v_s_";

/// Separator between payload fields.
const FIELD_DELIMITER: char = '~';

/// Raw field sets keyed by symbol, together with every line that was skipped.
#[derive(Clone, Debug, Default)]
pub struct ParsedResponse {
    pub records: BTreeMap<String, RawFieldSet>,
    pub errors: Vec<LineError>,
}

impl ParsedResponse {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a whole response body. Never fails; bad lines end up in `errors`.
pub fn parse_response(body: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    for (index, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;

        match tokenize_line(line) {
            Ok((symbol, fields)) => {
                if parsed.records.contains_key(&symbol) {
                    parsed.errors.push(LineError {
                        line_number,
                        symbol: Some(symbol.clone()),
                        line: line.to_string(),
                        kind: ProtocolErrorKind::DuplicateSymbol(symbol),
                    });
                } else {
                    parsed.records.insert(symbol, fields);
                }
            }
            Err((symbol, kind)) => {
                debug!("Skipping line {}: {}", line_number, kind);
                parsed.errors.push(LineError {
                    line_number,
                    symbol,
                    line: line.to_string(),
                    kind,
                });
            }
        }
    }

    parsed
}

/// Frame one line into its symbol and raw fields.
///
/// On failure returns the symbol when framing got far enough to reveal it.
pub fn tokenize_line(
    line: &str,
) -> Result<(String, RawFieldSet), (Option<String>, ProtocolErrorKind)> {
    let line = line.trim();

    let rest = line
        .strip_prefix(LINE_PREFIX)
        .ok_or((None, ProtocolErrorKind::MissingPrefix))?;

    let (symbol, payload) = rest
        .split_once('=')
        .ok_or((None, ProtocolErrorKind::MissingAssignment))?;

    let symbol = symbol.trim();
    if !is_valid_symbol(symbol) {
        return Err((None, ProtocolErrorKind::InvalidSymbol(symbol.to_string())));
    }

    let payload = strip_framing(payload)
        .ok_or_else(|| (Some(symbol.to_string()), ProtocolErrorKind::MalformedPayload))?;

    let fields: Vec<&str> = payload.split(FIELD_DELIMITER).collect();
    let raw = RawFieldSet::from_fields(&fields).map_err(|kind| (Some(symbol.to_string()), kind))?;

    Ok((symbol.to_string(), raw))
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `"<payload>";` -> `<payload>`
fn strip_framing(payload: &str) -> Option<&str> {
    payload
        .trim()
        .strip_suffix(';')?
        .trim_end()
        .strip_prefix('"')?
        .strip_suffix('"')
}
