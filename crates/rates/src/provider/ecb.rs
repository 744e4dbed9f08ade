//! ECB adapter: XML reference rates with dated cubes.
//!
//! `GET https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml`
//! returns the euro foreign exchange reference rates as nested `Cube`
//! elements, one dated cube wrapping one `<Cube currency="USD"
//! rate="1.0876"/>` per currency. The feed is always EUR-anchored; for
//! another base the table is re-based by dividing through the base's EUR
//! rate.

use async_trait::async_trait;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::convert::normalize_rates;
use crate::errors::Result;
use crate::models::RateMapping;
use crate::provider::{ensure_sanity, fetch_failed, RateProvider, REQUEST_TIMEOUT};

const PROVIDER_ID: &str = "ecb";
const FEED_URL: &str = "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml";

/// European Central Bank reference-rate provider.
pub struct EcbProvider {
    client: Client,
}

impl EcbProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Parse the cube XML into a normalized mapping anchored at
    /// `base_currency`.
    fn parse_payload(body: &str, base_currency: &str) -> Result<RateMapping> {
        let mut reader = Reader::from_str(body);
        let mut eur_rates: RateMapping = HashMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Cube" =>
                {
                    let mut currency: Option<String> = None;
                    let mut rate: Option<String> = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"currency" => {
                                currency = Some(String::from_utf8_lossy(&attr.value).into_owned())
                            }
                            b"rate" => {
                                rate = Some(String::from_utf8_lossy(&attr.value).into_owned())
                            }
                            _ => {}
                        }
                    }

                    // Outer cubes carry only a time attribute; skip them.
                    let (Some(currency), Some(rate_str)) = (currency, rate) else {
                        continue;
                    };

                    match Decimal::from_str(&rate_str) {
                        Ok(rate) => {
                            eur_rates.insert(currency.to_uppercase(), rate);
                        }
                        Err(_) => warn!(
                            "{}: dropping unparsable rate {} = {}",
                            PROVIDER_ID, currency, rate_str
                        ),
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(fetch_failed(PROVIDER_ID, e)),
            }
        }

        if eur_rates.is_empty() {
            return Err(fetch_failed(PROVIDER_ID, "no rate cubes in feed"));
        }

        let rates = Self::rebase(eur_rates, base_currency)?;
        let rates = normalize_rates(rates, base_currency);
        ensure_sanity(PROVIDER_ID, base_currency, &rates)?;
        Ok(rates)
    }

    /// Re-anchor the EUR-based table at another base by dividing through
    /// the base's EUR rate. A base absent from the feed is a failed fetch.
    fn rebase(mut eur_rates: RateMapping, base_currency: &str) -> Result<RateMapping> {
        eur_rates.insert("EUR".to_string(), Decimal::ONE);

        if base_currency == "EUR" {
            return Ok(eur_rates);
        }

        let Some(base_rate) = eur_rates.get(base_currency).copied() else {
            return Err(fetch_failed(
                PROVIDER_ID,
                format!("feed does not quote base currency {}", base_currency),
            ));
        };

        if base_rate.is_zero() {
            return Err(fetch_failed(
                PROVIDER_ID,
                format!("zero rate for base currency {}", base_currency),
            ));
        }

        Ok(eur_rates
            .into_iter()
            .filter_map(|(code, rate)| rate.checked_div(base_rate).map(|r| (code, r)))
            .collect())
    }
}

impl Default for EcbProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for EcbProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rates(&self, base_currency: &str) -> Result<RateMapping> {
        debug!("{}: fetching {}", PROVIDER_ID, FEED_URL);

        let response = self
            .client
            .get(FEED_URL)
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
