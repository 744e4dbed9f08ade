//! Rate provider trait and adapter implementations.
//!
//! Each adapter knows how to fetch and parse rates from exactly one
//! external source into a normalized [`RateMapping`]. The three sources
//! deliberately have different payload shapes (flat JSON map, nested
//! per-currency objects, XML cubes); the parsing variety is what keeps the
//! abstraction honest.
//!
//! Adapters never write to the cache and never let an error escape as
//! anything other than [`RateError::FetchFailed`]; the orchestrator
//! records the failure and moves on.

pub mod ecb;
pub mod floatrates;
pub mod frankfurter;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{RateError, Result};
use crate::models::RateMapping;

pub use ecb::EcbProvider;
pub use floatrates::FloatRatesProvider;
pub use frankfurter::FrankfurterProvider;

/// HTTP request timeout for all adapters.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Reference currency used to sanity-check a fetched payload. A mapping
/// that cannot quote USD is treated as a failed fetch.
pub(crate) const SANITY_CURRENCY: &str = "USD";

/// Trait for exchange-rate providers.
///
/// Implement this to add support for a new rate source. The engine walks
/// providers in its configured priority order and treats every failure as
/// transient.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier for this provider, a constant string like
    /// "frankfurter". Used for logging, caching, and breaker tracking.
    fn id(&self) -> &'static str;

    /// Fetch today's rate table anchored at `base_currency`.
    ///
    /// On success the mapping contains the base mapped to exactly `1` and
    /// passes the USD sanity check. Any failure is
    /// [`RateError::FetchFailed`].
    async fn fetch_rates(&self, base_currency: &str) -> Result<RateMapping>;
}

/// Parse a JSON number into a `Decimal` from its textual representation.
///
/// `serde_json` is built with `arbitrary_precision`, so the literal digits
/// survive to this point; going through f64 here would defeat that.
pub(crate) fn decimal_from_json_number(number: &serde_json::Number) -> Option<Decimal> {
    let repr = number.to_string();
    Decimal::from_str(&repr)
        .or_else(|_| Decimal::from_scientific(&repr))
        .ok()
}

/// Reject a payload that cannot quote the sanity currency.
pub(crate) fn ensure_sanity(
    provider: &'static str,
    base_currency: &str,
    rates: &RateMapping,
) -> Result<()> {
    if base_currency == SANITY_CURRENCY || rates.contains_key(SANITY_CURRENCY) {
        Ok(())
    } else {
        Err(RateError::FetchFailed {
            provider: provider.to_string(),
            message: format!("payload missing sanity currency {}", SANITY_CURRENCY),
        })
    }
}

pub(crate) fn fetch_failed(provider: &'static str, message: impl ToString) -> RateError {
    RateError::FetchFailed {
        provider: provider.to_string(),
        message: message.to_string(),
    }
}
