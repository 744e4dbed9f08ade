//! FloatRates adapter: nested per-currency JSON objects.
//!
//! `GET https://www.floatrates.com/daily/eur.json` returns a map keyed by
//! lowercase currency code, each value an object carrying the code, name,
//! rate and inverse rate:
//! `{"usd":{"code":"USD","name":"U.S. Dollar","rate":1.0876,...},...}`.
//! The base currency itself does not appear in the map.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::convert::normalize_rates;
use crate::errors::Result;
use crate::models::RateMapping;
use crate::provider::{
    decimal_from_json_number, ensure_sanity, fetch_failed, RateProvider, REQUEST_TIMEOUT,
};

const PROVIDER_ID: &str = "floatrates";
const BASE_URL: &str = "https://www.floatrates.com/daily";

#[derive(Debug, Deserialize)]
struct FloatRatesEntry {
    code: String,
    rate: serde_json::Number,
}

/// FloatRates (floatrates.com) rate provider.
pub struct FloatRatesProvider {
    client: Client,
}

impl FloatRatesProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Parse the nested per-currency payload into a normalized mapping.
    ///
    /// Entries whose rate cannot be parsed are dropped; the currency code
    /// is taken from the entry body, not the (lowercase) map key.
    fn parse_payload(body: &str, base_currency: &str) -> Result<RateMapping> {
        let entries: HashMap<String, FloatRatesEntry> =
            serde_json::from_str(body).map_err(|e| fetch_failed(PROVIDER_ID, e))?;

        if entries.is_empty() {
            return Err(fetch_failed(PROVIDER_ID, "empty rate table"));
        }

        let mut rates: RateMapping = HashMap::with_capacity(entries.len() + 1);
        for entry in entries.values() {
            match decimal_from_json_number(&entry.rate) {
                Some(rate) => {
                    rates.insert(entry.code.to_uppercase(), rate);
                }
                None => warn!(
                    "{}: dropping unparsable rate {} = {}",
                    PROVIDER_ID, entry.code, entry.rate
                ),
            }
        }

        let rates = normalize_rates(rates, base_currency);
        ensure_sanity(PROVIDER_ID, base_currency, &rates)?;
        Ok(rates)
    }
}

impl Default for FloatRatesProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for FloatRatesProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rates(&self, base_currency: &str) -> Result<RateMapping> {
        let url = format!("{}/{}.json", BASE_URL, base_currency.to_lowercase());
        debug!("{}: fetching {}", PROVIDER_ID, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_failed(PROVIDER_ID, e))?
            .error_for_status()
            .map_err(|e| fetch_failed(PROVIDER_ID, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| fetch_failed(PROVIDER_ID, e))?;

        Self::parse_payload(&body, base_currency)
    }
}
