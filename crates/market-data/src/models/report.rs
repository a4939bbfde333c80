use chrono::{DateTime, Utc};
use serde::Serialize;

use super::quote::{QuoteRecord, Trend};

/// Breadth summary of the known indices.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub up_count: usize,
    pub down_count: usize,
    pub flat_count: usize,
    pub total_count: usize,
    /// Headline composites, in the order they were requested
    pub major_indices: Vec<QuoteRecord>,
}

impl MarketOverview {
    /// Count records by trend and pick out the named major indices.
    pub fn from_records(records: &[QuoteRecord], major_symbols: &[String]) -> Self {
        let count = |trend: Trend| records.iter().filter(|r| r.trend == trend).count();

        let major_indices = major_symbols
            .iter()
            .filter_map(|symbol| records.iter().find(|r| &r.symbol == symbol))
            .cloned()
            .collect();

        Self {
            up_count: count(Trend::Up),
            down_count: count(Trend::Down),
            flat_count: count(Trend::Flat),
            total_count: records.len(),
            major_indices,
        }
    }
}

/// Outcome of one self-test check.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
    pub duration_ms: u64,
}

/// Result of [`QuoteService::test_data_sources`](crate::QuoteService::test_data_sources).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceReport {
    pub connectivity: CheckResult,
    pub data_quality: CheckResult,
    pub performance: CheckResult,
    /// True only when every check passed
    pub overall: bool,
    pub timestamp: DateTime<Utc>,
}

impl DataSourceReport {
    pub fn new(connectivity: CheckResult, data_quality: CheckResult, performance: CheckResult) -> Self {
        let overall = connectivity.passed && data_quality.passed && performance.passed;
        Self {
            connectivity,
            data_quality,
            performance,
            overall,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(passed: bool) -> CheckResult {
        CheckResult {
            passed,
            detail: String::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn test_overall_requires_every_check() {
        assert!(DataSourceReport::new(check(true), check(true), check(true)).overall);
        assert!(!DataSourceReport::new(check(true), check(false), check(true)).overall);
    }
}
