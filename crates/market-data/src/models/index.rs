use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Leading character of the composite market/status field for Shanghai listings.
///
/// Unverified: the composite field is only known to start with `1` for
/// Shanghai quotes. Everything else is treated as Shenzhen.
pub const SHANGHAI_MARKER: char = '1';

/// Fallback base price for registry entries that do not configure one.
const DEFAULT_BASE_PRICE: i64 = 3000;

/// Exchange a quote is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketId {
    /// Shanghai Stock Exchange
    #[serde(rename = "SH")]
    Shanghai,
    /// Shenzhen Stock Exchange
    #[serde(rename = "SZ")]
    Shenzhen,
}

impl MarketId {
    /// Normalize the first raw protocol field into a market.
    pub fn from_status_code(code: &str) -> Self {
        if code.trim_start().starts_with(SHANGHAI_MARKER) {
            Self::Shanghai
        } else {
            Self::Shenzhen
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shanghai => "SH",
            Self::Shenzhen => "SZ",
        }
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static configuration for one index the service knows about.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Upstream symbol without the `s_` request prefix (e.g. "sh000001")
    pub symbol: Cow<'static, str>,
    /// Display name
    pub name: Cow<'static, str>,
    /// Listing exchange
    pub market: MarketId,
    /// Short human description
    pub description: Cow<'static, str>,
    /// Base price used when synthesizing fallback quotes
    pub base_price: Decimal,
    /// Whether the index is a headline composite shown in the market overview
    pub major: bool,
}

impl IndexConfig {
    pub fn new(
        symbol: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        market: MarketId,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market,
            description: description.into(),
            base_price: Decimal::from(DEFAULT_BASE_PRICE),
            major: false,
        }
    }

    pub fn with_base_price(mut self, base_price: Decimal) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn major(mut self) -> Self {
        self.major = true;
        self
    }
}

/// Read-only registry of known indices, kept in display order.
#[derive(Clone, Debug)]
pub struct IndexRegistry {
    entries: Vec<IndexConfig>,
}

impl IndexRegistry {
    pub fn new(entries: Vec<IndexConfig>) -> Self {
        Self { entries }
    }

    pub fn get(&self, symbol: &str) -> Option<&IndexConfig> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// All symbols in registry order.
    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.to_string()).collect()
    }

    /// Symbols of the headline composites, in registry order.
    pub fn major_symbols(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.major)
            .map(|e| e.symbol.to_string())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexConfig> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new(vec![
            IndexConfig::new("sh000001", "上证指数", MarketId::Shanghai, "SSE Composite Index")
                .with_base_price(Decimal::new(320000, 2))
                .major(),
            IndexConfig::new("sz399001", "深证成指", MarketId::Shenzhen, "SZSE Component Index")
                .with_base_price(Decimal::new(1050000, 2))
                .major(),
            IndexConfig::new("sz399006", "创业板指", MarketId::Shenzhen, "ChiNext Index")
                .with_base_price(Decimal::new(210000, 2))
                .major(),
            IndexConfig::new("sh000300", "沪深300", MarketId::Shanghai, "CSI 300 Index")
                .with_base_price(Decimal::new(380000, 2))
                .major(),
            IndexConfig::new("sh000016", "上证50", MarketId::Shanghai, "SSE 50 Index")
                .with_base_price(Decimal::new(260000, 2)),
            IndexConfig::new("sh000905", "中证500", MarketId::Shanghai, "CSI 500 Index")
                .with_base_price(Decimal::new(580000, 2)),
            IndexConfig::new("sh000688", "科创50", MarketId::Shanghai, "STAR 50 Index")
                .with_base_price(Decimal::new(90000, 2)),
            IndexConfig::new("sz399005", "中小板指", MarketId::Shenzhen, "SME Board Index")
                .with_base_price(Decimal::new(650000, 2)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_status_code() {
        assert_eq!(MarketId::from_status_code("1"), MarketId::Shanghai);
        assert_eq!(MarketId::from_status_code("100"), MarketId::Shanghai);
        assert_eq!(MarketId::from_status_code("51"), MarketId::Shenzhen);
        assert_eq!(MarketId::from_status_code(""), MarketId::Shenzhen);
    }

    #[test]
    fn test_market_serializes_as_exchange_code() {
        assert_eq!(
            serde_json::to_string(&MarketId::Shanghai).unwrap(),
            "\"SH\""
        );
        assert_eq!(
            serde_json::to_string(&MarketId::Shenzhen).unwrap(),
            "\"SZ\""
        );
    }

    #[test]
    fn test_default_registry() {
        let registry = IndexRegistry::default();
        assert_eq!(registry.len(), 8);
        assert!(registry.contains("sh000001"));
        assert!(!registry.contains("sh999999"));
        assert_eq!(
            registry.major_symbols(),
            vec!["sh000001", "sz399001", "sz399006", "sh000300"]
        );
        assert_eq!(registry.symbols()[0], "sh000001");
    }

    #[test]
    fn test_custom_entry_defaults() {
        let entry = IndexConfig::new("sh000999", "Test", MarketId::Shanghai, "Test index");
        assert_eq!(entry.base_price, Decimal::from(3000));
        assert!(!entry.major);
    }
}
