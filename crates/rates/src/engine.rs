//! Fallback orchestrator: the engine's single entry point.
//!
//! `get_rates` walks the configured provider priority list, consulting the
//! cache store and circuit breaker, invoking adapters, and degrading to
//! stale or static data when everything fails. Availability problems of
//! upstream sources never surface as errors; only store failures and
//! malformed persisted data propagate.

use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::breaker::CircuitBreaker;
use crate::convert::convert_amount;
use crate::currencies::{static_fallback_rates, STATIC_PROVIDER};
use crate::errors::{RateError, Result};
use crate::models::{AttemptOutcome, FetchLog, ProviderAttempt, RateMapping, RateOrigin, ServedBy};
use crate::provider::{EcbProvider, FloatRatesProvider, FrankfurterProvider, RateProvider};
use crate::store::RateStore;

/// Engine configuration: one base currency for the whole deployment, an
/// ordered provider priority list, and the cache refresh interval.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub base_currency: String,
    pub provider_priority: Vec<String>,
    pub refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_currency: "EUR".to_string(),
            provider_priority: vec![
                "frankfurter".to_string(),
                "floatrates".to_string(),
                "ecb".to_string(),
            ],
            refresh_interval: Duration::minutes(1440),
        }
    }
}

/// Per-request memo of fetched mappings, keyed by base currency.
///
/// Held by the caller for the duration of one request to avoid redundant
/// walks within that request's lifetime, and discarded at request end.
#[derive(Default)]
pub struct RequestRateCache {
    rates: HashMap<String, RateMapping>,
}

impl RequestRateCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Multi-provider exchange-rate engine.
///
/// Explicitly constructed and dependency-injected: it owns its provider
/// list, breaker state and configuration, and borrows the store through
/// [`RateStore`]. Callers share it behind an `Arc`.
pub struct RateEngine {
    providers: Vec<Arc<dyn RateProvider>>,
    store: Arc<dyn RateStore>,
    breaker: CircuitBreaker,
    config: EngineConfig,
    last_served: RwLock<Option<ServedBy>>,
    last_log: RwLock<FetchLog>,
}

impl RateEngine {
    /// Build an engine over the given providers, ordered by the configured
    /// priority list.
    ///
    /// Every identifier in the priority list must match a supplied
    /// provider; supplied providers absent from the list are ignored with
    /// a warning.
    pub fn new(
        providers: Vec<Arc<dyn RateProvider>>,
        store: Arc<dyn RateStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        if config.provider_priority.is_empty() {
            return Err(RateError::InvalidConfig(
                "provider priority list is empty".to_string(),
            ));
        }

        let mut ordered: Vec<Arc<dyn RateProvider>> =
            Vec::with_capacity(config.provider_priority.len());
        for id in &config.provider_priority {
            let provider = providers
                .iter()
                .find(|p| p.id() == id)
                .cloned()
                .ok_or_else(|| {
                    RateError::InvalidConfig(format!("unknown provider in priority list: {}", id))
                })?;
            ordered.push(provider);
        }

        for provider in &providers {
            if !config.provider_priority.iter().any(|id| id == provider.id()) {
                warn!(
                    "Provider '{}' is not in the priority list, ignoring",
                    provider.id()
                );
            }
        }

        Ok(Self {
            providers: ordered,
            store,
            breaker: CircuitBreaker::new(),
            config,
            last_served: RwLock::new(None),
            last_log: RwLock::new(FetchLog::new()),
        })
    }

    /// Build an engine wired to the three built-in adapters.
    pub fn with_default_providers(store: Arc<dyn RateStore>, config: EngineConfig) -> Result<Self> {
        let providers: Vec<Arc<dyn RateProvider>> = vec![
            Arc::new(FrankfurterProvider::new()),
            Arc::new(FloatRatesProvider::new()),
            Arc::new(EcbProvider::new()),
        ];
        Self::new(providers, store, config)
    }

    /// Get today's rate mapping for a base currency.
    ///
    /// Degradation chain: fresh cache -> live fetch in priority order ->
    /// most recent cached snapshot for today from any provider -> static
    /// table. Returns `Err` only for store failures or malformed persisted
    /// snapshots, never for provider availability.
    pub async fn get_rates(&self, base_currency: &str, force_refresh: bool) -> Result<RateMapping> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut log = FetchLog::new();

        // Fast path: a fresh snapshot from the primary provider means the
        // rest of the list never gets walked.
        if !force_refresh {
            if let Some(primary) = self.providers.first() {
                if let Some(snapshot) = self.store.get(today, base_currency, primary.id())? {
                    if snapshot.is_fresh(self.config.refresh_interval, now) {
                        debug!(
                            "Using cached {} rates from primary provider '{}'",
                            base_currency,
                            primary.id()
                        );
                        log.record(primary.id(), AttemptOutcome::CacheHit);
                        self.finish(log, primary.id().to_string(), RateOrigin::Cache);
                        return Ok(snapshot.rates);
                    }
                }
            }
        }

        for provider in &self.providers {
            let id = provider.id();

            if self.breaker.is_open(id) {
                debug!("Circuit open for provider '{}', skipping", id);
                log.record(id, AttemptOutcome::CircuitOpen);
                continue;
            }

            if !force_refresh {
                if let Some(snapshot) = self.store.get(today, base_currency, id)? {
                    if snapshot.is_fresh(self.config.refresh_interval, now) {
                        debug!("Using cached {} rates from provider '{}'", base_currency, id);
                        log.record(id, AttemptOutcome::CacheHit);
                        self.finish(log, id.to_string(), RateOrigin::Cache);
                        return Ok(snapshot.rates);
                    }
                }
            }

            match provider.fetch_rates(base_currency).await {
                Ok(rates) => {
                    self.breaker.record_success(id);
                    self.store.upsert(base_currency, id, &rates).await?;
                    info!(
                        "Fetched {} {} rates via provider '{}'",
                        rates.len(),
                        base_currency,
                        id
                    );
                    log.record(id, AttemptOutcome::Fetched);
                    self.finish(log, id.to_string(), RateOrigin::Live);
                    return Ok(rates);
                }
                Err(e) => {
                    self.breaker.record_failure(id);
                    warn!(
                        "Provider '{}' failed to fetch {} rates: {}. Trying next.",
                        id, base_currency, e
                    );
                    log.record(id, AttemptOutcome::Failed(e.to_string()));
                }
            }
        }

        // Every provider failed or was skipped: fall back to the most
        // recently fetched snapshot for today, whichever provider wrote it.
        if let Some(snapshot) = self.store.get_latest_any_provider(today, base_currency)? {
            warn!(
                "All providers unavailable for {}; serving cached snapshot from '{}' [{}]",
                base_currency,
                snapshot.provider,
                log.summary()
            );
            let provider = snapshot.provider.clone();
            self.finish(log, provider, RateOrigin::FallbackCached);
            return Ok(snapshot.rates);
        }

        error!(
            "{} for {}; serving static fallback table [{}]",
            RateError::AllProvidersExhausted,
            base_currency,
            log.summary()
        );
        self.finish(log, STATIC_PROVIDER.to_string(), RateOrigin::FallbackStatic);
        Ok(static_fallback_rates(base_currency))
    }

    /// `get_rates` memoized against a request-scoped cache.
    pub async fn get_rates_memoized(
        &self,
        cache: &mut RequestRateCache,
        base_currency: &str,
        force_refresh: bool,
    ) -> Result<RateMapping> {
        if !force_refresh {
            if let Some(rates) = cache.rates.get(base_currency) {
                return Ok(rates.clone());
            }
        }
        let rates = self.get_rates(base_currency, force_refresh).await?;
        cache.rates.insert(base_currency.to_string(), rates.clone());
        Ok(rates)
    }

    /// Convert an amount between two currencies.
    ///
    /// Uses the supplied mapping when given, otherwise fetches rates for
    /// the configured base currency. Sits in cost-display paths, so every
    /// failure mode returns the amount unconverted.
    pub async fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        rates: Option<&RateMapping>,
    ) -> Decimal {
        if from_currency == to_currency {
            return amount;
        }

        match rates {
            Some(rates) => convert_amount(
                amount,
                from_currency,
                to_currency,
                rates,
                &self.config.base_currency,
            ),
            None => {
                let base = self.config.base_currency.clone();
                match self.get_rates(&base, false).await {
                    Ok(rates) => {
                        convert_amount(amount, from_currency, to_currency, &rates, &base)
                    }
                    Err(e) => {
                        warn!(
                            "Conversion {}->{} left unconverted, rates unavailable: {}",
                            from_currency, to_currency, e
                        );
                        amount
                    }
                }
            }
        }
    }

    /// Delete today's snapshots for a base currency so the next call is
    /// forced to refetch. Used when the preferred provider changes.
    /// Returns whether anything was deleted.
    pub async fn clear_today_cache(&self, base_currency: &str) -> Result<bool> {
        let deleted = self.store.clear_today(base_currency).await?;
        if deleted > 0 {
            info!(
                "Cleared {} cached snapshot(s) for {} today",
                deleted, base_currency
            );
        }
        Ok(deleted > 0)
    }

    /// Identifier of whichever source served the most recent result.
    pub fn last_provider(&self) -> Option<String> {
        self.last_served
            .read()
            .ok()
            .and_then(|served| served.as_ref().map(|s| s.provider.clone()))
    }

    /// Identity and provenance of the most recent result.
    pub fn last_served(&self) -> Option<ServedBy> {
        self.last_served.read().ok().and_then(|s| s.clone())
    }

    /// Ordered attempt log of the most recent `get_rates` walk.
    pub fn last_attempts(&self) -> Vec<ProviderAttempt> {
        self.last_log
            .read()
            .map(|log| log.attempts.clone())
            .unwrap_or_default()
    }

    fn finish(&self, log: FetchLog, provider: String, origin: RateOrigin) {
        if let Ok(mut last_log) = self.last_log.write() {
            *last_log = log;
        }
        if let Ok(mut last_served) = self.last_served.write() {
            *last_served = Some(ServedBy { provider, origin });
        }
    }
}
