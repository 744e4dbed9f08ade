//! SQLite-backed [`RateStore`] implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use subtally_rates::{RateMapping, RateSnapshot, RateStore, Result};

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::rate_snapshots;
use crate::snapshots::model::RateSnapshotRow;

/// Durable snapshot store over a pooled SQLite connection.
///
/// Upserts use `REPLACE INTO`, so a same-key write is last-write-wins
/// without a read-modify-write cycle.
pub struct SqliteRateStore {
    pool: Arc<DbPool>,
}

impl SqliteRateStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateStore for SqliteRateStore {
    fn get(
        &self,
        date: NaiveDate,
        base_currency: &str,
        provider: &str,
    ) -> Result<Option<RateSnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = rate_snapshots::table
            .find((date, base_currency, provider))
            .first::<RateSnapshotRow>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(RateSnapshot::try_from).transpose()
    }

    fn get_latest_any_provider(
        &self,
        date: NaiveDate,
        base_currency: &str,
    ) -> Result<Option<RateSnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = rate_snapshots::table
            .filter(rate_snapshots::date.eq(date))
            .filter(rate_snapshots::base_currency.eq(base_currency))
            .order(rate_snapshots::fetched_at.desc())
            .first::<RateSnapshotRow>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(RateSnapshot::try_from).transpose()
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
        let row = RateSnapshotRow::from_domain(&snapshot)?;

        let mut conn = get_connection(&self.pool)?;
        diesel::replace_into(rate_snapshots::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(StorageError::from)?;

        debug!(
            "Stored {} {} rates for {} from {}",
            snapshot.rates.len(),
            base_currency,
            snapshot.date,
            provider
        );
        Ok(snapshot)
    }

    async fn clear_today(&self, base_currency: &str) -> Result<usize> {
        let today = Utc::now().date_naive();
        let mut conn = get_connection(&self.pool)?;

        let deleted = diesel::delete(
            rate_snapshots::table
                .filter(rate_snapshots::date.eq(today))
                .filter(rate_snapshots::base_currency.eq(base_currency)),
        )
        .execute(&mut conn)
        .map_err(StorageError::from)?;

        debug!("Cleared {} cached {} snapshot(s)", deleted, base_currency);
        Ok(deleted)
    }
}
