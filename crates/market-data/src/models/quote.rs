use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::index::MarketId;

/// Qualitative direction derived from the sign of the percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change_percent(change_percent: Decimal) -> Self {
        if change_percent > Decimal::ZERO {
            Self::Up
        } else if change_percent < Decimal::ZERO {
            Self::Down
        } else {
            Self::Flat
        }
    }
}

/// Pre-formatted strings for widgets that render quotes verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDisplay {
    /// Price rounded to two decimals (e.g. "3200.50")
    pub price: String,
    /// Signed change in points (e.g. "+15.20")
    pub change: String,
    /// Signed change in percent (e.g. "+0.48%")
    pub change_percent: String,
    /// Volume with unit suffix (e.g. "1.23M")
    pub volume: String,
    /// Turnover with unit suffix
    pub amount: String,
    /// Market capitalisation with unit suffix
    pub market_cap: String,
}

/// One normalized point-in-time quote.
///
/// Built fresh on every poll cycle and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Upstream symbol, stable key (e.g. "sh000001")
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
    pub trend: Trend,
    /// When the record was normalized
    pub timestamp: DateTime<Utc>,
    pub display: QuoteDisplay,
}

impl QuoteRecord {
    /// Equality that ignores the normalization timestamp.
    pub fn same_quote(&self, other: &QuoteRecord) -> bool {
        self.symbol == other.symbol
            && self.market_id == other.market_id
            && self.name == other.name
            && self.code == other.code
            && self.current_price == other.current_price
            && self.change_points == other.change_points
            && self.change_percent == other.change_percent
            && self.volume == other.volume
            && self.amount == other.amount
            && self.market_cap == other.market_cap
            && self.security_type == other.security_type
            && self.trend == other.trend
            && self.display == other.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trend_from_sign() {
        assert_eq!(Trend::from_change_percent(dec!(0.48)), Trend::Up);
        assert_eq!(Trend::from_change_percent(dec!(-0.21)), Trend::Down);
        assert_eq!(Trend::from_change_percent(dec!(0)), Trend::Flat);
        assert_eq!(Trend::from_change_percent(dec!(0.00)), Trend::Flat);
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Trend::Up).unwrap(), "\"up\"");
        assert_eq!(serde_json::to_string(&Trend::Flat).unwrap(), "\"flat\"");
    }
}
