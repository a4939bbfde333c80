//! Display strings for dashboard widgets.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::QuoteDisplay;

/// Magnitude tiers, largest first.
const SCALE_TIERS: [(i64, &str); 3] = [
    (1_000_000_000, "B"),
    (1_000_000, "M"),
    (1_000, "K"),
];

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price rounded to two decimals.
pub fn format_price(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

/// Two decimals with an explicit `+` for positive values.
pub fn format_signed(value: Decimal) -> String {
    let rounded = round2(value);
    if rounded > Decimal::ZERO {
        format!("+{:.2}", rounded)
    } else if rounded < Decimal::ZERO {
        format!("{:.2}", rounded)
    } else {
        "0.00".to_string()
    }
}

pub fn format_signed_percent(value: Decimal) -> String {
    format!("{}%", format_signed(value))
}

/// Scale by magnitude and append a K/M/B suffix; small values print as-is.
pub fn format_scaled(value: Decimal) -> String {
    let magnitude = value.abs();
    for (threshold, suffix) in SCALE_TIERS {
        let threshold = Decimal::from(threshold);
        if magnitude >= threshold {
            return format!("{:.2}{}", round2(value / threshold), suffix);
        }
    }
    round2(value).normalize().to_string()
}

/// Build every display string for one quote.
pub fn build_display(
    current_price: Decimal,
    change_points: Decimal,
    change_percent: Decimal,
    volume: i64,
    amount: Decimal,
    market_cap: Decimal,
) -> QuoteDisplay {
    QuoteDisplay {
        price: format_price(current_price),
        change: format_signed(change_points),
        change_percent: format_signed_percent(change_percent),
        volume: format_scaled(Decimal::from(volume)),
        amount: format_scaled(amount),
        market_cap: format_scaled(market_cap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(3200.5)), "3200.50");
        assert_eq!(format_price(dec!(3200.505)), "3200.51");
        assert_eq!(format_price(dec!(0)), "0.00");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(dec!(15.2)), "+15.20");
        assert_eq!(format_signed(dec!(-6.789)), "-6.79");
        assert_eq!(format_signed(dec!(0.001)), "0.00");
        assert_eq!(format_signed_percent(dec!(0.48)), "+0.48%");
        assert_eq!(format_signed_percent(dec!(-0.21)), "-0.21%");
    }

    #[test]
    fn test_format_scaled_tiers() {
        assert_eq!(format_scaled(dec!(999)), "999");
        assert_eq!(format_scaled(dec!(1500)), "1.50K");
        assert_eq!(format_scaled(dec!(1234567)), "1.23M");
        assert_eq!(format_scaled(dec!(123456789)), "123.46M");
        assert_eq!(format_scaled(dec!(9876543210)), "9.88B");
        assert_eq!(format_scaled(dec!(0)), "0");
    }
}
