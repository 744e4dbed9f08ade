//! Frankfurter adapter: flat JSON rate map.
//!
//! `GET https://api.frankfurter.dev/v1/latest?base=EUR` returns
//! `{"base":"EUR","date":"2025-08-25","rates":{"USD":1.0876,...}}`.
//! No API key required.

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

const PROVIDER_ID: &str = "frankfurter";
const BASE_URL: &str = "https://api.frankfurter.dev/v1/latest";

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[allow(dead_code)]
    base: String,
    rates: HashMap<String, serde_json::Number>,
}

/// Frankfurter (frankfurter.dev) rate provider.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Parse the flat JSON payload into a normalized mapping.
    fn parse_payload(body: &str, base_currency: &str) -> Result<RateMapping> {
        let response: FrankfurterResponse =
            serde_json::from_str(body).map_err(|e| fetch_failed(PROVIDER_ID, e))?;

        let mut rates: RateMapping = HashMap::with_capacity(response.rates.len() + 1);
        for (code, number) in &response.rates {
            match decimal_from_json_number(number) {
                Some(rate) => {
                    rates.insert(code.to_uppercase(), rate);
                }
                None => warn!(
                    "{}: dropping unparsable rate {} = {}",
                    PROVIDER_ID, code, number
                ),
            }
        }

        let rates = normalize_rates(rates, base_currency);
        ensure_sanity(PROVIDER_ID, base_currency, &rates)?;
        Ok(rates)
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rates(&self, base_currency: &str) -> Result<RateMapping> {
        let url = format!("{}?base={}", BASE_URL, base_currency);
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const FIXTURE: &str = r#"{
        "amount": 1.0,
        "base": "EUR",
        "date": "2025-08-22",
        "rates": {"USD": 1.0876, "GBP": 0.8571, "JPY": 157.42, "SEK": 11.2835}
    }"#;

    #[test]
    fn test_parse_flat_payload() {
        let rates = FrankfurterProvider::parse_payload(FIXTURE, "EUR").unwrap();
        assert_eq!(rates["USD"], dec!(1.0876));
        assert_eq!(rates["GBP"], dec!(0.8571));
        assert_eq!(rates["JPY"], dec!(157.42));
        // Frankfurter omits the base from its rates; normalization adds it.
        assert_eq!(rates["EUR"], Decimal::ONE);
    }

    #[test]
    fn test_missing_sanity_currency_is_a_failure() {
        let body = r#"{"base":"EUR","date":"2025-08-22","rates":{"GBP":0.8571}}"#;
        assert!(FrankfurterProvider::parse_payload(body, "EUR").is_err());
    }

    #[test]
    fn test_malformed_payload_is_a_failure() {
        assert!(FrankfurterProvider::parse_payload("not json", "EUR").is_err());
        assert!(FrankfurterProvider::parse_payload(r#"{"base":"EUR"}"#, "EUR").is_err());
    }

    #[test]
    fn test_zero_rates_are_dropped_but_payload_survives() {
        let body = r#"{"base":"EUR","date":"2025-08-22","rates":{"USD":1.0876,"XXX":0}}"#;
        let rates = FrankfurterProvider::parse_payload(body, "EUR").unwrap();
        assert!(!rates.contains_key("XXX"));
        assert_eq!(rates["USD"], dec!(1.0876));
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(FrankfurterProvider::new().id(), "frankfurter");
    }
}
