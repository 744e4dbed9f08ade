//! End-to-end degradation chain against a real SQLite store.

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use subtally_rates::{
    EngineConfig, RateEngine, RateError, RateMapping, RateOrigin, RateProvider, RateStore, Result,
};
use subtally_storage_sqlite::{init, SqliteRateStore};

struct StubProvider {
    id: &'static str,
    rates: Option<RateMapping>,
}

impl StubProvider {
    fn succeeding(id: &'static str, rates: RateMapping) -> Arc<Self> {
        Arc::new(Self {
            id,
            rates: Some(rates),
        })
    }

    fn failing(id: &'static str) -> Arc<Self> {
        Arc::new(Self { id, rates: None })
    }
}

#[async_trait]
impl RateProvider for StubProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn fetch_rates(&self, _base_currency: &str) -> Result<RateMapping> {
        match &self.rates {
            Some(rates) => Ok(rates.clone()),
            None => Err(RateError::FetchFailed {
                provider: self.id.to_string(),
                message: "stub failure".to_string(),
            }),
        }
    }
}

fn eur_usd(rate: Decimal) -> RateMapping {
    HashMap::from([("EUR".to_string(), dec!(1)), ("USD".to_string(), rate)])
}

fn config(priority: &[&str], refresh_minutes: i64) -> EngineConfig {
    EngineConfig {
        base_currency: "EUR".to_string(),
        provider_priority: priority.iter().map(|s| s.to_string()).collect(),
        refresh_interval: Duration::minutes(refresh_minutes),
    }
}

fn open_store(dir: &tempfile::TempDir) -> Arc<SqliteRateStore> {
    let db_path = dir.path().join("rates.db");
    let pool = init(db_path.to_str().unwrap()).unwrap();
    Arc::new(SqliteRateStore::new(pool))
}

#[tokio::test]
async fn test_live_fetch_persists_and_serves_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let engine = RateEngine::new(
        vec![StubProvider::succeeding("p1", eur_usd(dec!(1.0876))) as Arc<dyn RateProvider>],
        store.clone() as Arc<dyn RateStore>,
        config(&["p1"], 1440),
    )
    .unwrap();

    let rates = engine.get_rates("EUR", false).await.unwrap();
    assert_eq!(rates["USD"], dec!(1.0876));
    assert_eq!(engine.last_served().unwrap().origin, RateOrigin::Live);

    // A second engine over the same database file serves the persisted
    // snapshot without any provider configured to succeed.
    let engine = RateEngine::new(
        vec![StubProvider::failing("p1") as Arc<dyn RateProvider>],
        store.clone() as Arc<dyn RateStore>,
        config(&["p1"], 1440),
    )
    .unwrap();

    let rates = engine.get_rates("EUR", false).await.unwrap();
    assert_eq!(rates["USD"], dec!(1.0876));
    assert_eq!(engine.last_served().unwrap().origin, RateOrigin::Cache);
}

#[tokio::test]
async fn test_stale_snapshot_beats_static_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    // Seed today's snapshot, then make it stale with a zero-minute
    // refresh interval and fail every provider.
    store
        .upsert("EUR", "p1", &eur_usd(dec!(1.2345)))
        .await
        .unwrap();

    let engine = RateEngine::new(
        vec![StubProvider::failing("p1") as Arc<dyn RateProvider>],
        store.clone() as Arc<dyn RateStore>,
        config(&["p1"], 0),
    )
    .unwrap();

    let rates = engine.get_rates("EUR", false).await.unwrap();
    assert_eq!(rates["USD"], dec!(1.2345));
    assert_eq!(
        engine.last_served().unwrap().origin,
        RateOrigin::FallbackCached
    );
}

#[tokio::test]
async fn test_empty_database_falls_back_to_static_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let engine = RateEngine::new(
        vec![StubProvider::failing("p1") as Arc<dyn RateProvider>],
        store.clone() as Arc<dyn RateStore>,
        config(&["p1"], 1440),
    )
    .unwrap();

    let rates = engine.get_rates("EUR", false).await.unwrap();
    assert_eq!(
        engine.last_served().unwrap().origin,
        RateOrigin::FallbackStatic
    );
    assert_eq!(rates["EUR"], Decimal::ONE);
    assert!(rates.contains_key("USD"));

    // Conversion still works off the static table.
    let converted = engine.convert(dec!(10), "EUR", "EUR", Some(&rates)).await;
    assert_eq!(converted, dec!(10));
}

#[tokio::test]
async fn test_clear_today_cache_forces_refetch() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let engine = RateEngine::new(
        vec![StubProvider::succeeding("p1", eur_usd(dec!(1.08))) as Arc<dyn RateProvider>],
        store.clone() as Arc<dyn RateStore>,
        config(&["p1"], 1440),
    )
    .unwrap();

    engine.get_rates("EUR", false).await.unwrap();
    assert!(engine.clear_today_cache("EUR").await.unwrap());

    engine.get_rates("EUR", false).await.unwrap();
    assert_eq!(engine.last_served().unwrap().origin, RateOrigin::Live);
}
