//! Durable snapshot storage contract and the in-memory implementation.
//!
//! The SQLite implementation lives in `subtally-storage-sqlite`; this crate
//! stays database-agnostic and works against [`RateStore`].

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::errors::Result;
use crate::models::{RateMapping, RateSnapshot};

/// Trait defining the contract for snapshot storage.
///
/// Upserts are last-write-wins on the (`date`, `base_currency`, `provider`)
/// key; concurrent writers for the same key are acceptable because same-day
/// snapshots are near-interchangeable approximations.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Snapshot for an exact (date, base, provider) key, if present.
    fn get(
        &self,
        date: NaiveDate,
        base_currency: &str,
        provider: &str,
    ) -> Result<Option<RateSnapshot>>;

    /// Most recently fetched snapshot for the day across all providers,
    /// used as the last-resort cached fallback.
    fn get_latest_any_provider(
        &self,
        date: NaiveDate,
        base_currency: &str,
    ) -> Result<Option<RateSnapshot>>;

    /// Write a snapshot for today, overwriting any existing one for the
    /// same key. Stamps the current fetch time.
    async fn upsert(
        &self,
        base_currency: &str,
        provider: &str,
        rates: &RateMapping,
    ) -> Result<RateSnapshot>;

    /// Delete all of today's snapshots for a base currency, across
    /// providers. Returns the number of deleted snapshots.
    async fn clear_today(&self, base_currency: &str) -> Result<usize>;
}

type SnapshotKey = (NaiveDate, String, String);

/// In-memory snapshot store for tests and database-free embedding.
#[derive(Default)]
pub struct MemoryRateStore {
    snapshots: Mutex<HashMap<SnapshotKey, RateSnapshot>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SnapshotKey, RateSnapshot>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    fn get(
        &self,
        date: NaiveDate,
        base_currency: &str,
        provider: &str,
    ) -> Result<Option<RateSnapshot>> {
        let snapshots = self.lock();
        Ok(snapshots
            .get(&(date, base_currency.to_string(), provider.to_string()))
            .cloned())
    }

    fn get_latest_any_provider(
        &self,
        date: NaiveDate,
        base_currency: &str,
    ) -> Result<Option<RateSnapshot>> {
        let snapshots = self.lock();
        Ok(snapshots
            .values()
            .filter(|s| s.date == date && s.base_currency == base_currency)
            .max_by_key(|s| s.fetched_at)
            .cloned())
    }

    async fn upsert(
        &self,
        base_currency: &str,
        provider: &str,
        rates: &RateMapping,
    ) -> Result<RateSnapshot> {
        let now = Utc::now();
        let snapshot = RateSnapshot {
            date: now.date_naive(),
            base_currency: base_currency.to_string(),
            provider: provider.to_string(),
            rates: rates.clone(),
            fetched_at: now,
        };

        let mut snapshots = self.lock();
        snapshots.insert(
            (
                snapshot.date,
                base_currency.to_string(),
                provider.to_string(),
            ),
            snapshot.clone(),
        );
        Ok(snapshot)
    }

    async fn clear_today(&self, base_currency: &str) -> Result<usize> {
        let today = Utc::now().date_naive();
        let mut snapshots = self.lock();
        let before = snapshots.len();
        snapshots.retain(|(date, base, _), _| !(*date == today && base == base_currency));
        Ok(before - snapshots.len())
    }
}
