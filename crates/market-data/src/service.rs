//! Quote service facade.
//!
//! A [`QuoteService`] owns one rate limiter, one upstream client and the
//! counters reported by [`QuoteService::get_service_stats`]. Every query runs
//! the same pipeline:
//!
//! ```text
//! rate limit -> request (retries) -> parse -> normalize -> validate
//!                     |
//!                     +-- exhausted --> synthetic fallback -> validate
//! ```
//!
//! Only [`QuoteService::get_single_index`] can fail; every other query
//! reports problems through the envelope.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::config::QuoteServiceConfig;
use crate::errors::MarketDataError;
use crate::models::{
    CheckResult, DataSourceReport, Diagnostics, IndexRegistry, MarketOverview, QuoteEnvelope,
    QuoteMap, QuoteRecord, ServiceStats,
};
use crate::protocol::{parse_response, FieldNormalizer, UNKNOWN_INDEX_NAME};
use crate::provider::gtimg::GtimgQuoteSource;
use crate::provider::QuoteSource;
use crate::registry::{
    FallbackGenerator, QuoteValidator, RateLimitConfig, RateLimiter, RetryPolicy, UpstreamClient,
};

/// Symbol probed by the connectivity check when the registry lists it.
const PROBE_SYMBOL: &str = "sh000001";

/// Fields counted by the data-quality check.
const KEY_FIELD_COUNT: usize = 5;

/// Result of one pass through the pipeline, before it is shaped for callers.
struct BatchOutcome {
    records: Vec<QuoteRecord>,
    requested: usize,
    is_mock: bool,
    diagnostics: Diagnostics,
}

impl BatchOutcome {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            requested: 0,
            is_mock: false,
            diagnostics: Diagnostics::default(),
        }
    }

    fn message(&self) -> String {
        if self.requested == 0 {
            "No symbols requested".to_string()
        } else if self.records.is_empty() {
            format!("No quotes available for {} requested symbols", self.requested)
        } else if self.is_mock && self.diagnostics.upstream_error.is_some() {
            format!(
                "Upstream unavailable; serving synthetic data for {} of {} symbols",
                self.records.len(),
                self.requested
            )
        } else if self.is_mock {
            format!(
                "No usable upstream quote; serving synthetic data for {} of {} symbols",
                self.records.len(),
                self.requested
            )
        } else {
            format!("Fetched {} of {} symbols", self.records.len(), self.requested)
        }
    }

    fn into_envelope<T>(
        self,
        request_count: u64,
        shape: impl FnOnce(Vec<QuoteRecord>) -> T,
    ) -> QuoteEnvelope<T> {
        let message = self.message();
        QuoteEnvelope {
            success: !self.records.is_empty(),
            message,
            timestamp: Utc::now(),
            request_count: Some(request_count),
            is_mock_data: self.is_mock.then_some(true),
            diagnostics: self.diagnostics,
            data: shape(self.records),
        }
    }
}

/// Dashboard-facing quote service for mainland-China indices.
pub struct QuoteService {
    upstream: UpstreamClient,
    rate_limiter: RateLimiter,
    normalizer: FieldNormalizer,
    validator: QuoteValidator,
    fallback: FallbackGenerator,
    registry: IndexRegistry,
    config: QuoteServiceConfig,
    request_count: AtomicU64,
    fallback_count: AtomicU64,
    last_request_at: Mutex<Option<DateTime<Utc>>>,
}

impl QuoteService {
    /// Create a service talking to the configured HTTP endpoint.
    pub fn new(config: QuoteServiceConfig) -> Result<Self, MarketDataError> {
        let source = GtimgQuoteSource::new(config.base_url.clone(), config.timeout)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a service on top of any quote source, using the default index registry.
    pub fn with_source(config: QuoteServiceConfig, source: Arc<dyn QuoteSource>) -> Self {
        Self::with_registry(config, source, IndexRegistry::default())
    }

    /// Create a service with a custom index registry.
    pub fn with_registry(
        config: QuoteServiceConfig,
        source: Arc<dyn QuoteSource>,
        registry: IndexRegistry,
    ) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            timeout: config.timeout,
        };
        let rate_limiter = RateLimiter::with_config(RateLimitConfig {
            min_interval: config.min_request_interval,
        });
        let fallback = FallbackGenerator::new(registry.clone())
            .with_base_prices(config.fallback_base_prices.clone());

        Self {
            upstream: UpstreamClient::new(source, policy),
            rate_limiter,
            normalizer: FieldNormalizer::new(),
            validator: QuoteValidator::new(),
            fallback,
            registry,
            config,
            request_count: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
            last_request_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &QuoteServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Quote for one symbol.
    ///
    /// A registry index the upstream did not answer for is served from the
    /// fallback generator and flagged as mock data. Fails with
    /// [`MarketDataError::UnknownSymbol`] only for symbols outside the registry.
    pub async fn get_single_index(
        &self,
        symbol: &str,
    ) -> Result<QuoteEnvelope<QuoteMap>, MarketDataError> {
        let requested = [symbol.trim().to_string()];
        let mut outcome = self.fetch_batch(&requested).await;
        if outcome.records.is_empty() && self.registry.contains(&requested[0]) {
            self.fill_from_fallback(&mut outcome, &requested);
        }
        if outcome.records.is_empty() {
            warn!("No quote could be produced for {}", symbol);
            return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
        }
        Ok(outcome.into_envelope(self.request_count(), into_map))
    }

    /// Quotes for several symbols in one upstream request.
    pub async fn get_batch_indices(&self, symbols: &[String]) -> QuoteEnvelope<QuoteMap> {
        let outcome = self.fetch_batch(symbols).await;
        outcome.into_envelope(self.request_count(), into_map)
    }

    /// Quotes for every registry index, in registry order.
    pub async fn get_all_major_indices(&self) -> QuoteEnvelope<Vec<QuoteRecord>> {
        let outcome = self.fetch_batch(&self.registry.symbols()).await;
        outcome.into_envelope(self.request_count(), |records| records)
    }

    /// Up/down/flat breadth over the registry plus the headline composites.
    pub async fn get_market_overview(&self) -> QuoteEnvelope<MarketOverview> {
        let majors = self.registry.major_symbols();
        let outcome = self.fetch_batch(&self.registry.symbols()).await;
        outcome.into_envelope(self.request_count(), |records| {
            MarketOverview::from_records(&records, &majors)
        })
    }

    /// Self-test: connectivity, data quality and performance.
    pub async fn test_data_sources(&self) -> DataSourceReport {
        info!("Running data source self-test against '{}'", self.upstream.source_id());

        let connectivity = self.connectivity_check().await;
        let data_quality = self.data_quality_check().await;
        let performance = self.performance_check().await;

        let report = DataSourceReport::new(connectivity, data_quality, performance);
        info!(
            "Data source self-test finished: overall {}",
            if report.overall { "passed" } else { "failed" }
        );
        report
    }

    /// Whether live (non-synthetic) data can currently be fetched.
    pub async fn check_connectivity(&self) -> bool {
        let Some(symbol) = self.probe_symbol() else {
            return false;
        };
        matches!(self.get_single_index(&symbol).await, Ok(envelope) if !envelope.is_mock())
    }

    pub fn get_service_stats(&self) -> ServiceStats {
        ServiceStats {
            request_count: self.request_count(),
            upstream_attempts: self.upstream.total_attempts(),
            fallback_count: self.fallback_count.load(Ordering::Relaxed),
            last_request_at: *self.last_request_guard(),
            max_retries: self.config.max_retries,
            retry_delay_ms: self.config.retry_delay.as_millis() as u64,
            timeout_ms: self.config.timeout.as_millis() as u64,
            min_request_interval_ms: self.config.min_request_interval.as_millis() as u64,
        }
    }

    /// Run the full pipeline for `symbols`.
    ///
    /// Records are assembled locally and only handed out once complete, so a
    /// dropped future leaves nothing half-built behind.
    async fn fetch_batch(&self, symbols: &[String]) -> BatchOutcome {
        let symbols = dedupe_symbols(symbols);
        if symbols.is_empty() {
            debug!("Empty symbol list, skipping upstream request");
            return BatchOutcome::empty();
        }

        debug!("Waiting for rate limiter ({} symbols)", symbols.len());
        self.rate_limiter.acquire().await;

        self.request_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request_guard() = Some(Utc::now());

        debug!("Requesting {} symbols", symbols.len());
        let mut diagnostics = Diagnostics::default();
        let (candidates, is_mock) = match self.upstream.fetch(&symbols).await {
            Ok(response) => {
                diagnostics.attempts = response.attempts;
                debug!("Parsing {} byte response", response.body.len());
                let records = self.normalize_body(&symbols, &response.body, &mut diagnostics);
                (records, false)
            }
            Err(e) => {
                if let MarketDataError::RetriesExhausted { attempts, .. } = &e {
                    diagnostics.attempts = *attempts;
                }
                warn!(
                    "Upstream exhausted for {} symbols: {}; serving synthetic data",
                    symbols.len(),
                    e
                );
                self.fallback_count.fetch_add(1, Ordering::Relaxed);
                diagnostics.upstream_error = Some(e.to_string());
                (self.fallback.generate(&symbols), true)
            }
        };

        debug!("Validating {} records", candidates.len());
        let (records, rejected) = self.validator.validate_batch(candidates);
        diagnostics.rejected = rejected;

        debug!(
            "Batch done: {} of {} symbols{}",
            records.len(),
            symbols.len(),
            if is_mock { " (synthetic)" } else { "" }
        );

        BatchOutcome {
            records,
            requested: symbols.len(),
            is_mock,
            diagnostics,
        }
    }

    /// Replace a live answer that produced no record with synthetic data.
    ///
    /// Line errors and rejections of the live attempt stay in the diagnostics.
    fn fill_from_fallback(&self, outcome: &mut BatchOutcome, symbols: &[String]) {
        if outcome.is_mock {
            return;
        }
        warn!(
            "Upstream returned no usable quote for {}; serving synthetic data",
            symbols.join(",")
        );
        self.fallback_count.fetch_add(1, Ordering::Relaxed);

        let (records, rejected) = self.validator.validate_batch(self.fallback.generate(symbols));
        outcome.diagnostics.rejected.extend(rejected);
        outcome.records = records;
        outcome.is_mock = true;
    }

    /// Parse and normalize a body, keeping request order.
    fn normalize_body(
        &self,
        symbols: &[String],
        body: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<QuoteRecord> {
        let mut parsed = parse_response(body);
        for error in &parsed.errors {
            warn!("{}; skipping line", error.to_error());
        }
        diagnostics.line_errors = std::mem::take(&mut parsed.errors);

        debug!("Normalizing {} raw field sets", parsed.records.len());
        let mut records = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match parsed.records.remove(symbol) {
                Some(raw) => records.push(self.normalizer.normalize(symbol, &raw)),
                None => debug!("No quote line for {}", symbol),
            }
        }
        for symbol in parsed.records.keys() {
            debug!("Ignoring unrequested symbol {}", symbol);
        }

        records
    }

    async fn connectivity_check(&self) -> CheckResult {
        let started = Instant::now();
        let Some(symbol) = self.probe_symbol() else {
            return CheckResult {
                passed: false,
                detail: "Index registry is empty".to_string(),
                duration_ms: 0,
            };
        };

        let (passed, detail) = match self.get_single_index(&symbol).await {
            Ok(envelope) if !envelope.is_mock() => {
                (true, format!("Fetched {} from upstream", symbol))
            }
            Ok(_) => (
                false,
                format!("Upstream unreachable; {} was served from fallback data", symbol),
            ),
            Err(e) => (false, e.to_string()),
        };

        CheckResult {
            passed,
            detail,
            duration_ms: elapsed_ms(started),
        }
    }

    async fn data_quality_check(&self) -> CheckResult {
        let started = Instant::now();
        let sample: Vec<String> = self
            .registry
            .symbols()
            .into_iter()
            .take(self.config.quality_sample_size.max(1))
            .collect();

        let outcome = self.fetch_batch(&sample).await;
        let duration_ms = elapsed_ms(started);

        if outcome.is_mock {
            return CheckResult {
                passed: false,
                detail: "Only synthetic data available".to_string(),
                duration_ms,
            };
        }

        let ratio = completeness_ratio(&outcome.records, sample.len());
        CheckResult {
            passed: ratio >= self.config.quality_threshold,
            detail: format!(
                "{:.0}% of key fields present across {} of {} sampled indices",
                ratio * 100.0,
                outcome.records.len(),
                sample.len()
            ),
            duration_ms,
        }
    }

    async fn performance_check(&self) -> CheckResult {
        let started = Instant::now();
        let outcome = self.fetch_batch(&self.registry.symbols()).await;
        let elapsed = started.elapsed();

        let within_budget = elapsed <= self.config.performance_budget;
        let passed = within_budget && !outcome.is_mock && !outcome.records.is_empty();

        CheckResult {
            passed,
            detail: format!(
                "Fetched {} indices in {} ms (budget {} ms)",
                outcome.records.len(),
                elapsed.as_millis(),
                self.config.performance_budget.as_millis()
            ),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    fn probe_symbol(&self) -> Option<String> {
        if self.registry.contains(PROBE_SYMBOL) {
            Some(PROBE_SYMBOL.to_string())
        } else {
            self.registry.symbols().into_iter().next()
        }
    }

    fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    fn last_request_guard(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        self.last_request_at.lock().unwrap_or_else(|poisoned| {
            warn!("Last-request mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Trim, drop blanks and keep only the first occurrence of each symbol.
fn dedupe_symbols(symbols: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.trim();
        if !symbol.is_empty() && !unique.iter().any(|s| s == symbol) {
            unique.push(symbol.to_string());
        }
    }
    unique
}

fn into_map(records: Vec<QuoteRecord>) -> QuoteMap {
    records
        .into_iter()
        .map(|record| (record.symbol.clone(), record))
        .collect()
}

/// Share of key fields (name, code, price, volume, amount) that carry data.
fn completeness_ratio(records: &[QuoteRecord], expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }

    let present: usize = records
        .iter()
        .map(|r| {
            [
                !r.name.is_empty() && r.name != UNKNOWN_INDEX_NAME,
                !r.code.is_empty(),
                r.current_price > Decimal::ZERO,
                r.volume > 0,
                r.amount > Decimal::ZERO,
            ]
            .iter()
            .filter(|present| **present)
            .count()
        })
        .sum();

    present as f64 / (KEY_FIELD_COUNT * expected) as f64
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
