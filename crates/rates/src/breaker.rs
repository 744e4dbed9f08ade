//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures per provider and suppresses calls to a
//! provider that has failed repeatedly, for a cool-down window. A provider
//! with no failure record is closed; three consecutive failures open it;
//! a recorded success or an elapsed cooldown clears the record and the next
//! call proceeds normally (there is no separate trial state).
//!
//! State is in-memory and resets on process restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Default number of consecutive failures before the circuit opens.
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default cool-down window after the last failure.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an opened circuit stays open after the last failure.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Failure record for a single provider.
#[derive(Debug)]
struct ProviderState {
    consecutive_failures: u32,
    last_failure_at: Instant,
}

/// Per-provider circuit breaker.
///
/// Thread-safe; owned by the engine and shared by reference across calls.
pub struct CircuitBreaker {
    states: Mutex<HashMap<String, ProviderState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a circuit breaker with default settings.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a circuit breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the state map, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a slightly stale failure count, which
    /// is better than panicking the calling request.
    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, ProviderState>> {
        self.states.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Check whether the circuit is open for a provider.
    ///
    /// Returns true iff the failure count has reached the threshold and the
    /// last failure is still within the cooldown window. Once the cooldown
    /// has elapsed the provider's record is cleared as a side effect of the
    /// check, so the next call proceeds normally.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut states = self.lock_states();

        let Some(state) = states.get(provider) else {
            return false;
        };

        if state.consecutive_failures < self.config.failure_threshold {
            return false;
        }

        if state.last_failure_at.elapsed() > self.config.cooldown {
            info!(
                "Circuit breaker: cooldown elapsed for '{}', closing circuit",
                provider
            );
            states.remove(provider);
            return false;
        }

        true
    }

    /// Record a failed call for a provider.
    pub fn record_failure(&self, provider: &str) {
        let mut states = self.lock_states();

        let state = states
            .entry(provider.to_string())
            .or_insert_with(|| ProviderState {
                consecutive_failures: 0,
                last_failure_at: Instant::now(),
            });

        state.consecutive_failures += 1;
        state.last_failure_at = Instant::now();

        if state.consecutive_failures == self.config.failure_threshold {
            info!(
                "Circuit breaker: opening circuit for '{}' after {} failures",
                provider, state.consecutive_failures
            );
        } else {
            debug!(
                "Circuit breaker: failure for '{}' ({}/{})",
                provider, state.consecutive_failures, self.config.failure_threshold
            );
        }
    }

    /// Record a successful call for a provider, clearing any failure record.
    pub fn record_success(&self, provider: &str) {
        let mut states = self.lock_states();

        if states.remove(provider).is_some() {
            debug!(
                "Circuit breaker: success for '{}', failure record cleared",
                provider
            );
        }
    }

    /// Current consecutive-failure count for a provider.
    pub fn failure_count(&self, provider: &str) -> u32 {
        let states = self.lock_states();

        states
            .get(provider)
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
