//! Database row for a persisted rate snapshot.
//!
//! Rates are stored as a JSON object in a `TEXT` column, currency code to
//! decimal string. Decimals serialize as strings, so no precision is lost
//! through the database round trip. A row whose JSON no longer decodes is
//! corrupt data and surfaces as [`RateError::InvalidSnapshot`].

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use diesel::prelude::*;
use subtally_rates::{RateError, RateMapping, RateSnapshot};

use crate::schema::rate_snapshots;

#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone)]
#[diesel(table_name = rate_snapshots)]
#[diesel(primary_key(date, base_currency, provider))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateSnapshotRow {
    pub date: NaiveDate,
    pub base_currency: String,
    pub provider: String,
    pub rates_json: String,
    pub fetched_at: NaiveDateTime,
}

impl RateSnapshotRow {
    pub fn from_domain(snapshot: &RateSnapshot) -> Result<Self, RateError> {
        let rates_json = serde_json::to_string(&snapshot.rates)
            .map_err(|e| RateError::InvalidSnapshot(e.to_string()))?;

        Ok(Self {
            date: snapshot.date,
            base_currency: snapshot.base_currency.clone(),
            provider: snapshot.provider.clone(),
            rates_json,
            fetched_at: snapshot.fetched_at.naive_utc(),
        })
    }
}

impl TryFrom<RateSnapshotRow> for RateSnapshot {
    type Error = RateError;

    fn try_from(row: RateSnapshotRow) -> Result<Self, RateError> {
        let rates: RateMapping = serde_json::from_str(&row.rates_json).map_err(|e| {
            RateError::InvalidSnapshot(format!(
                "{}/{}/{}: {}",
                row.date, row.base_currency, row.provider, e
            ))
        })?;

        Ok(RateSnapshot {
            date: row.date,
            base_currency: row.base_currency,
            provider: row.provider,
            rates,
            fetched_at: Utc.from_utc_datetime(&row.fetched_at),
        })
    }
}
