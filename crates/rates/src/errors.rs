//! Error types for the rates engine.
//!
//! The engine distinguishes availability failures (a provider being down,
//! rate-limited, or returning garbage) from programming errors (a broken
//! store, malformed persisted JSON). Availability failures are handled
//! inside [`RateEngine`](crate::engine::RateEngine) and never reach the
//! caller; the remaining variants do propagate.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, RateError>;

/// Errors that can occur during rate acquisition and conversion.
#[derive(Error, Debug)]
pub enum RateError {
    /// A provider fetch failed: network error, bad status, unparsable
    /// payload, or a payload that failed the sanity check.
    /// Recovered by the orchestrator, which moves on to the next provider.
    #[error("Provider fetch failed: {provider} - {message}")]
    FetchFailed {
        /// The provider that failed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The circuit breaker is open for this provider.
    /// Recorded in the attempt log; the provider is skipped.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// Every provider failed or was skipped and nothing is cached for
    /// today. Resolved by serving the static fallback table; logged at
    /// error severity but the call still returns usable data.
    #[error("All providers exhausted")]
    AllProvidersExhausted,

    /// No rate is available for the requested currency in the supplied
    /// mapping. Conversion entry points fail soft on this and return the
    /// amount unconverted.
    #[error("No rate available for currency: {0}")]
    MissingRate(String),

    /// A storage operation failed. This is an infrastructure error, not a
    /// data-availability degradation, and propagates to the caller.
    #[error("Rate store error: {0}")]
    Store(String),

    /// A persisted snapshot could not be decoded. Malformed stored JSON is
    /// a programming error and is treated as fatal to the calling request.
    #[error("Invalid stored snapshot: {0}")]
    InvalidSnapshot(String),

    /// The engine was constructed with an unusable configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RateError {
    /// True for failure modes the orchestrator absorbs by degrading to
    /// staler data instead of propagating.
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::CircuitOpen { .. } | Self::AllProvidersExhausted
        )
    }
}
