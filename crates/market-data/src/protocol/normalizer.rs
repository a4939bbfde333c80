//! Raw field sets to typed quote records.

use std::str::FromStr;

use chrono::Utc;
use log::{debug, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::display::build_display;
use super::encoding::repair_text;
use crate::models::{MarketId, QuoteRecord, RawFieldSet, Trend};

/// Name used when the upstream name is empty or beyond repair.
pub const UNKNOWN_INDEX_NAME: &str = "Unknown Index";

/// Typed quote values before derived data (trend, display, timestamp) is attached.
///
/// Shared by the normalizer and the fallback generator so both derive
/// trend and display strings the same way.
#[derive(Clone, Debug)]
pub struct QuoteFields {
    pub symbol: String,
    pub market_id: MarketId,
    pub name: String,
    pub code: String,
    pub current_price: Decimal,
    pub change_points: Decimal,
    pub change_percent: Decimal,
    pub volume: i64,
    pub amount: Decimal,
    pub market_cap: Decimal,
    pub security_type: String,
}

impl QuoteFields {
    /// Attach trend, display strings and the normalization timestamp.
    pub fn into_record(self) -> QuoteRecord {
        let display = build_display(
            self.current_price,
            self.change_points,
            self.change_percent,
            self.volume,
            self.amount,
            self.market_cap,
        );

        QuoteRecord {
            trend: Trend::from_change_percent(self.change_percent),
            symbol: self.symbol,
            market_id: self.market_id,
            name: self.name,
            code: self.code,
            current_price: self.current_price,
            change_points: self.change_points,
            change_percent: self.change_percent,
            volume: self.volume,
            amount: self.amount,
            market_cap: self.market_cap,
            security_type: self.security_type,
            timestamp: Utc::now(),
            display,
        }
    }
}

/// Converts raw protocol fields into [`QuoteRecord`]s.
///
/// Numeric garbage never fails normalization: unparsable values become zero
/// and out-of-range values are left for the validator to reject.
#[derive(Clone, Debug, Default)]
pub struct FieldNormalizer;

impl FieldNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, symbol: &str, raw: &RawFieldSet) -> QuoteRecord {
        self.to_fields(symbol, raw).into_record()
    }

    pub fn to_fields(&self, symbol: &str, raw: &RawFieldSet) -> QuoteFields {
        QuoteFields {
            symbol: symbol.to_string(),
            market_id: MarketId::from_status_code(&raw.market_status),
            name: normalize_name(symbol, &raw.name),
            code: raw.code.trim().to_string(),
            current_price: parse_decimal(&raw.price),
            change_points: parse_decimal(&raw.change_points),
            change_percent: parse_decimal(&raw.change_percent),
            volume: parse_integer(&raw.volume),
            amount: parse_decimal(&raw.amount),
            market_cap: parse_decimal(&raw.market_cap),
            security_type: raw.security_type.trim().to_string(),
        }
    }
}

fn normalize_name(symbol: &str, raw: &str) -> String {
    match repair_text(raw) {
        Ok(name) => name,
        Err(e) => {
            warn!("Unusable name for {}: {}", symbol, e);
            UNKNOWN_INDEX_NAME.to_string()
        }
    }
}

/// Lenient decimal parse; anything unparsable is zero.
pub fn parse_decimal(value: &str) -> Decimal {
    let value = value.trim();
    if value.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or_else(|_| {
            debug!("Unparsable numeric field '{}', using 0", value);
            Decimal::ZERO
        })
}

/// Lenient integer parse; fractional input is truncated, garbage is zero.
pub fn parse_integer(value: &str) -> i64 {
    let value = value.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| parse_decimal(value).trunc().to_i64())
        .unwrap_or(0)
}
