//! Synthetic quotes served when the upstream stays unreachable.
//!
//! Records are built through the same [`QuoteFields`] path the normalizer
//! uses, so trend and display strings are derived identically. Callers must
//! flag anything produced here as mock data.

use std::collections::HashMap;

use log::debug;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::models::{IndexConfig, IndexRegistry, QuoteRecord};
use crate::protocol::QuoteFields;

/// Largest synthetic move, in percent, either direction.
const MAX_SYNTHETIC_CHANGE_PERCENT: f64 = 2.0;

/// Synthetic volume range, in shares.
const VOLUME_RANGE: std::ops::RangeInclusive<i64> = 50_000_000..=500_000_000;

/// Synthetic turnover range, in currency units.
const AMOUNT_RANGE: std::ops::RangeInclusive<i64> = 5_000_000_000..=80_000_000_000;

/// Generates plausible quotes for registry indices.
pub struct FallbackGenerator {
    registry: IndexRegistry,
    base_prices: HashMap<String, Decimal>,
}

impl FallbackGenerator {
    pub fn new(registry: IndexRegistry) -> Self {
        Self {
            registry,
            base_prices: HashMap::new(),
        }
    }

    /// Override registry base prices for specific symbols.
    pub fn with_base_prices(mut self, base_prices: HashMap<String, Decimal>) -> Self {
        self.base_prices = base_prices;
        self
    }

    /// Base price used for `entry`, honouring overrides.
    pub fn base_price(&self, entry: &IndexConfig) -> Decimal {
        self.base_prices
            .get(entry.symbol.as_ref())
            .copied()
            .unwrap_or(entry.base_price)
    }

    /// Synthesize quotes for `symbols` using the thread-local RNG.
    pub fn generate(&self, symbols: &[String]) -> Vec<QuoteRecord> {
        self.generate_with_rng(symbols, &mut rand::thread_rng())
    }

    /// Synthesize quotes for `symbols`; symbols missing from the registry are
    /// skipped. Output follows input order.
    pub fn generate_with_rng<R: Rng>(
        &self,
        symbols: &[String],
        rng: &mut R,
    ) -> Vec<QuoteRecord> {
        symbols
            .iter()
            .filter_map(|symbol| match self.registry.get(symbol) {
                Some(entry) => Some(self.synthesize(entry, rng)),
                None => {
                    debug!("No registry entry for {}, skipping synthetic quote", symbol);
                    None
                }
            })
            .collect()
    }

    fn synthesize<R: Rng>(&self, entry: &IndexConfig, rng: &mut R) -> QuoteRecord {
        let base = self.base_price(entry);

        let raw_percent =
            rng.gen_range(-MAX_SYNTHETIC_CHANGE_PERCENT..=MAX_SYNTHETIC_CHANGE_PERCENT);
        let change_percent = Decimal::from_f64(raw_percent)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        let change_points = (base * change_percent / Decimal::ONE_HUNDRED).round_dp(2);

        QuoteFields {
            symbol: entry.symbol.to_string(),
            market_id: entry.market,
            name: entry.name.to_string(),
            code: listing_code(&entry.symbol),
            current_price: base + change_points,
            change_points,
            change_percent,
            volume: rng.gen_range(VOLUME_RANGE),
            amount: Decimal::from(rng.gen_range(AMOUNT_RANGE)),
            market_cap: Decimal::ZERO,
            security_type: entry.market.as_str().to_string(),
        }
        .into_record()
    }
}

/// Exchange code without the two-letter market prefix.
fn listing_code(symbol: &str) -> String {
    let lower = symbol.to_ascii_lowercase();
    if lower.starts_with("sh") || lower.starts_with("sz") {
        symbol[2..].to_string()
    } else {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MarketId, Trend};
    use crate::registry::QuoteValidator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generates_registry_symbols_only() {
        let generator = FallbackGenerator::new(IndexRegistry::default());
        let mut rng = StdRng::seed_from_u64(7);

        let records =
            generator.generate_with_rng(&symbols(&["sz399001", "xx123", "sh000001"]), &mut rng);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "sz399001");
        assert_eq!(records[0].market_id, MarketId::Shenzhen);
        assert_eq!(records[0].name, "深证成指");
        assert_eq!(records[0].code, "399001");
        assert_eq!(records[1].symbol, "sh000001");
        assert_eq!(records[1].code, "000001");
    }

    #[test]
    fn test_change_stays_within_two_percent() {
        let generator = FallbackGenerator::new(IndexRegistry::default());
        let mut rng = StdRng::seed_from_u64(42);
        let all = IndexRegistry::default().symbols();

        for _ in 0..50 {
            for record in generator.generate_with_rng(&all, &mut rng) {
                assert!(record.change_percent.abs() <= dec!(2));
                assert_eq!(record.trend, Trend::from_change_percent(record.change_percent));
                assert!(record.volume > 0);
                assert!(record.amount > Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_points_derive_from_base_price() {
        let generator = FallbackGenerator::new(IndexRegistry::default());
        let mut rng = StdRng::seed_from_u64(3);

        let record = generator
            .generate_with_rng(&symbols(&["sh000001"]), &mut rng)
            .remove(0);

        let expected_points = (dec!(3200) * record.change_percent / dec!(100)).round_dp(2);
        assert_eq!(record.change_points, expected_points);
        assert_eq!(record.current_price, dec!(3200) + expected_points);
    }

    #[test]
    fn test_base_price_override() {
        let generator = FallbackGenerator::new(IndexRegistry::default()).with_base_prices(
            [("sh000001".to_string(), dec!(1000))].into_iter().collect(),
        );
        let mut rng = StdRng::seed_from_u64(11);

        let record = generator
            .generate_with_rng(&symbols(&["sh000001"]), &mut rng)
            .remove(0);

        assert!(record.current_price >= dec!(980));
        assert!(record.current_price <= dec!(1020));
    }

    #[test]
    fn test_same_seed_same_output() {
        let generator = FallbackGenerator::new(IndexRegistry::default());
        let all = IndexRegistry::default().symbols();

        let a = generator.generate_with_rng(&all, &mut StdRng::seed_from_u64(99));
        let b = generator.generate_with_rng(&all, &mut StdRng::seed_from_u64(99));

        assert_eq!(a.len(), b.len());
        for (left, right) in a.iter().zip(&b) {
            assert!(left.same_quote(right));
        }
    }

    #[test]
    fn test_synthetic_quotes_pass_validation() {
        let generator = FallbackGenerator::new(IndexRegistry::default());
        let validator = QuoteValidator::new();

        let records = generator.generate(&IndexRegistry::default().symbols());
        let (valid, rejected) = validator.validate_batch(records);

        assert_eq!(valid.len(), 8);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_listing_code() {
        assert_eq!(listing_code("sh000300"), "000300");
        assert_eq!(listing_code("SZ399006"), "399006");
        assert_eq!(listing_code("hk00700"), "hk00700");
    }
}
