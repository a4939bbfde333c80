//! Quote data validation.
//!
//! Validates normalized quotes before they reach consumers:
//! - Non-empty symbol, unique within a batch
//! - Non-negative price, volume, turnover and market cap
//! - Percentage change within the daily limit band
//!
//! The market is a closed enum, so membership in the two known exchanges is
//! guaranteed by the type and needs no runtime check.

use log::warn;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::models::{QuoteRecord, RejectedQuote};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - exclude the quote.
    Hard,
    /// Soft warning - accept quote but log warning.
    Soft,
}

/// Validation result details.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Description of the issue.
    pub message: String,
}

/// Outcome of validating one quote.
#[derive(Clone, Debug)]
pub struct ValidationResult {
    pub valid: bool,
    /// Hard violations; empty when `valid`.
    pub errors: Vec<String>,
    /// Soft issues that did not cause rejection.
    pub warnings: Vec<String>,
}

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Largest accepted absolute percentage change.
    pub max_abs_change_percent: Decimal,
    /// Whether to warn on zero volume (market closed or suspended).
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_abs_change_percent: Decimal::from(20),
            warn_on_zero_volume: true,
        }
    }
}

/// Quote data validator.
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote against the domain invariants.
    ///
    /// Warnings are logged but do not cause rejection.
    pub fn validate(&self, quote: &QuoteRecord) -> ValidationResult {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        self.validate_symbol(quote, &mut issues);
        self.validate_price(quote, &mut issues);
        self.validate_change(quote, &mut issues);
        self.validate_volume(quote, &mut issues);
        self.validate_amounts(quote, &mut issues);

        let (hard, soft): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|i| i.severity == ValidationSeverity::Hard);

        let warnings: Vec<String> = soft.into_iter().map(|i| i.message).collect();
        for warning in &warnings {
            warn!("Quote validation warning for {}: {}", quote.symbol, warning);
        }

        ValidationResult {
            valid: hard.is_empty(),
            errors: hard.into_iter().map(|i| i.message).collect(),
            warnings,
        }
    }

    /// Validate all quotes in a batch.
    ///
    /// Returns a tuple of (valid_quotes, rejected_quotes). A symbol seen twice
    /// keeps its first valid record; later ones are rejected.
    pub fn validate_batch(&self, quotes: Vec<QuoteRecord>) -> (Vec<QuoteRecord>, Vec<RejectedQuote>) {
        let mut valid = Vec::with_capacity(quotes.len());
        let mut rejected = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for quote in quotes {
            let result = self.validate(&quote);
            if !result.valid {
                let rejection = RejectedQuote {
                    symbol: quote.symbol,
                    errors: result.errors,
                };
                warn!("Rejected quote: {}", rejection.to_error());
                rejected.push(rejection);
                continue;
            }

            if !seen.insert(quote.symbol.clone()) {
                let rejection = RejectedQuote {
                    errors: vec![format!("Duplicate symbol in batch: {}", quote.symbol)],
                    symbol: quote.symbol,
                };
                warn!("Rejected quote: {}", rejection.to_error());
                rejected.push(rejection);
                continue;
            }

            valid.push(quote);
        }

        (valid, rejected)
    }

    fn validate_symbol(&self, quote: &QuoteRecord, issues: &mut Vec<ValidationIssue>) {
        if quote.symbol.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: "Empty symbol".to_string(),
            });
        }
    }

    fn validate_price(&self, quote: &QuoteRecord, issues: &mut Vec<ValidationIssue>) {
        if quote.current_price < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative price: {}", quote.current_price),
            });
        }
    }

    fn validate_change(&self, quote: &QuoteRecord, issues: &mut Vec<ValidationIssue>) {
        if quote.change_percent.abs() > self.config.max_abs_change_percent {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Change percent ({}) exceeds limit ({})",
                    quote.change_percent, self.config.max_abs_change_percent
                ),
            });
        }
    }

    fn validate_volume(&self, quote: &QuoteRecord, issues: &mut Vec<ValidationIssue>) {
        if quote.volume < 0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative volume: {}", quote.volume),
            });
        }

        if self.config.warn_on_zero_volume && quote.volume == 0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero volume".to_string(),
            });
        }
    }

    fn validate_amounts(&self, quote: &QuoteRecord, issues: &mut Vec<ValidationIssue>) {
        if quote.amount < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative amount: {}", quote.amount),
            });
        }

        if quote.market_cap < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative market cap: {}", quote.market_cap),
            });
        }
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketDataError;
    use crate::models::MarketId;
    use crate::protocol::QuoteFields;
    use rust_decimal_macros::dec;

    fn make_quote(symbol: &str, price: Decimal, change_percent: Decimal) -> QuoteRecord {
        QuoteFields {
            symbol: symbol.to_string(),
            market_id: MarketId::Shanghai,
            name: "上证指数".to_string(),
            code: "000001".to_string(),
            current_price: price,
            change_points: dec!(1),
            change_percent,
            volume: 1000,
            amount: dec!(50000),
            market_cap: dec!(100000),
            security_type: "SH".to_string(),
        }
        .into_record()
    }

    #[test]
    fn test_valid_quote() {
        let validator = QuoteValidator::new();
        let result = validator.validate(&make_quote("sh000001", dec!(3200.5), dec!(0.48)));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_negative_price_rejected() {
        let validator = QuoteValidator::new();
        let result = validator.validate(&make_quote("sh000001", dec!(-1), dec!(0)));
        assert!(!result.valid);
        assert!(result.errors[0].contains("Negative price"));
    }

    #[test]
    fn test_change_percent_bound() {
        let validator = QuoteValidator::new();
        assert!(validator.validate(&make_quote("a", dec!(1), dec!(20))).valid);
        assert!(validator.validate(&make_quote("a", dec!(1), dec!(-20))).valid);
        assert!(!validator.validate(&make_quote("a", dec!(1), dec!(20.01))).valid);
        assert!(!validator.validate(&make_quote("a", dec!(1), dec!(-35))).valid);
    }

    #[test]
    fn test_negative_quantities_collect_every_error() {
        let validator = QuoteValidator::new();
        let mut quote = make_quote("sh000001", dec!(1), dec!(0));
        quote.volume = -5;
        quote.amount = dec!(-1);
        quote.market_cap = dec!(-2);

        let result = validator.validate(&quote);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let validator = QuoteValidator::new();
        assert!(!validator.validate(&make_quote("", dec!(1), dec!(0))).valid);
    }

    #[test]
    fn test_zero_volume_only_warns() {
        let validator = QuoteValidator::new();
        let mut quote = make_quote("sh000001", dec!(1), dec!(0));
        quote.volume = 0;

        let result = validator.validate(&quote);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["Zero volume".to_string()]);
    }

    #[test]
    fn test_custom_limit() {
        let validator = QuoteValidator::with_config(ValidatorConfig {
            max_abs_change_percent: dec!(10),
            ..Default::default()
        });
        assert!(!validator.validate(&make_quote("a", dec!(1), dec!(10.5))).valid);
    }

    #[test]
    fn test_batch_validation() {
        let validator = QuoteValidator::new();

        let quotes = vec![
            make_quote("sh000001", dec!(100), dec!(1)),  // valid
            make_quote("sz399001", dec!(-10), dec!(1)),  // invalid
            make_quote("sz399006", dec!(200), dec!(-1)), // valid
            make_quote("sh000001", dec!(101), dec!(1)),  // duplicate
        ];

        let (valid, rejected) = validator.validate_batch(quotes);

        assert_eq!(valid.len(), 2);
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].symbol, "sz399001");
        assert!(rejected[1].errors[0].contains("Duplicate"));
        assert_eq!(valid[0].current_price, dec!(100));

        let error = rejected[0].to_error();
        assert!(matches!(
            &error,
            MarketDataError::ValidationFailed { symbol, message }
                if symbol == "sz399001" && message.starts_with("Negative price")
        ));
    }
}
