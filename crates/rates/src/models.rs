//! Domain models for the rates engine.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping of currency code to decimal rate, anchored at one base currency.
///
/// The base currency is always present mapped to exactly `1`. Absence of a
/// code means "not convertible with this mapping".
pub type RateMapping = HashMap<String, Decimal>;

/// One provider's rates for one day, as persisted by the cache store.
///
/// At most one snapshot exists per (`date`, `base_currency`, `provider`)
/// triple; writes for an existing key overwrite.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    pub date: NaiveDate,
    pub base_currency: String,
    pub provider: String,
    pub rates: RateMapping,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// A snapshot is usable without a refetch while its age stays within
    /// the configured refresh interval.
    pub fn is_fresh(&self, refresh_interval: Duration, now: DateTime<Utc>) -> bool {
        now - self.fetched_at <= refresh_interval
    }
}

/// How a provider attempt ended during one `get_rates` walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A fresh cached snapshot was served without a network call.
    CacheHit,
    /// The provider was called and returned a usable mapping.
    Fetched,
    /// The circuit breaker was open; the provider was skipped.
    CircuitOpen,
    /// The fetch failed with the recorded reason.
    Failed(String),
}

/// Record of a single provider attempt.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Ordered log of provider attempts for one `get_rates` call.
#[derive(Clone, Debug, Default)]
pub struct FetchLog {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchLog {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record(&mut self, provider: &str, outcome: AttemptOutcome) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            outcome,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::CacheHit => format!("{}: CACHE", a.provider),
                AttemptOutcome::Fetched => format!("{}: FETCHED", a.provider),
                AttemptOutcome::CircuitOpen => format!("{}: SKIPPED (circuit open)", a.provider),
                AttemptOutcome::Failed(reason) => format!("{}: FAILED ({})", a.provider, reason),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any attempt produced a mapping.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::CacheHit | AttemptOutcome::Fetched))
    }
}

/// Where the mapping returned by the most recent `get_rates` call came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateOrigin {
    /// Fresh snapshot from the cache store.
    Cache,
    /// Live fetch from a provider.
    Live,
    /// Stale snapshot served because every provider failed or was skipped.
    FallbackCached,
    /// Hardcoded approximate table; nothing was cached for today.
    FallbackStatic,
}

impl std::fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Live => write!(f, "live"),
            Self::FallbackCached => write!(f, "fallback-cached"),
            Self::FallbackStatic => write!(f, "fallback-static"),
        }
    }
}

/// Identity and provenance of whichever source served the latest result.
#[derive(Clone, Debug)]
pub struct ServedBy {
    pub provider: String,
    pub origin: RateOrigin,
}
