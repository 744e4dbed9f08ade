//! Subtally rates engine.
//!
//! Multi-provider acquisition and conversion of daily currency exchange
//! rates: fetch from one of several unreliable third-party sources, cache
//! snapshots durably, degrade gracefully when sources fail, and convert
//! amounts across arbitrary currency pairs with decimal precision.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |    RateEngine    |  (fallback orchestrator, entry point)
//! +------------------+
//!    |       |      |
//!    v       v      v
//! +------+ +-----+ +----------+
//! |Circuit| |Rate | | Provider |  (frankfurter / floatrates / ecb)
//! |Breaker| |Store| | adapters |
//! +------+ +-----+ +----------+
//! ```
//!
//! Degradation chain: fresh cache -> live fetch in priority order ->
//! stale cache from any provider -> static constants. Upstream
//! availability problems never surface as errors; the engine keeps
//! returning a best-effort mapping.
//!
//! The durable [`RateStore`] implementation on SQLite lives in the
//! `subtally-storage-sqlite` crate; this crate is database-agnostic.

pub mod breaker;
pub mod convert;
pub mod currencies;
pub mod engine;
pub mod errors;
pub mod models;
pub mod provider;
pub mod store;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use convert::{convert_amount, normalize_rates};
pub use currencies::{
    currency_symbol, static_fallback_rates, STATIC_PROVIDER, SUPPORTED_CURRENCIES,
};
pub use engine::{EngineConfig, RateEngine, RequestRateCache};
pub use errors::{RateError, Result};
pub use models::{
    AttemptOutcome, FetchLog, ProviderAttempt, RateMapping, RateOrigin, RateSnapshot, ServedBy,
};
pub use provider::{EcbProvider, FloatRatesProvider, FrankfurterProvider, RateProvider};
pub use store::{MemoryRateStore, RateStore};
