//! Static currency metadata and the absolute-last-resort rate table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::models::RateMapping;

/// Provider identifier reported when the static table served the result.
pub const STATIC_PROVIDER: &str = "static";

/// Supported currencies with display labels, EUR first.
pub const SUPPORTED_CURRENCIES: &[(&str, &str)] = &[
    ("EUR", "Euro (€)"),
    ("USD", "US Dollar ($)"),
    ("GBP", "British Pound (£)"),
    ("CAD", "Canadian Dollar (C$)"),
    ("AUD", "Australian Dollar (A$)"),
    ("JPY", "Japanese Yen (¥)"),
    ("CHF", "Swiss Franc (CHF)"),
    ("CNY", "Chinese Yuan (¥)"),
    ("INR", "Indian Rupee (₹)"),
    ("SEK", "Swedish Krona (kr)"),
    ("NOK", "Norwegian Krone (kr)"),
    ("DKK", "Danish Krone (kr)"),
    ("PLN", "Polish Zloty (zł)"),
    ("CZK", "Czech Koruna (Kč)"),
    ("HUF", "Hungarian Forint (Ft)"),
    ("BGN", "Bulgarian Lev (лв)"),
    ("RON", "Romanian Leu (lei)"),
    ("HRK", "Croatian Kuna (kn)"),
    ("RUB", "Russian Ruble (₽)"),
    ("TRY", "Turkish Lira (₺)"),
    ("BRL", "Brazilian Real (R$)"),
    ("MXN", "Mexican Peso ($)"),
    ("SGD", "Singapore Dollar (S$)"),
    ("HKD", "Hong Kong Dollar (HK$)"),
    ("KRW", "South Korean Won (₩)"),
    ("ZAR", "South African Rand (R)"),
    ("NZD", "New Zealand Dollar (NZ$)"),
    ("THB", "Thai Baht (฿)"),
    ("MYR", "Malaysian Ringgit (RM)"),
    ("PHP", "Philippine Peso (₱)"),
    ("IDR", "Indonesian Rupiah (Rp)"),
    ("VND", "Vietnamese Dong (₫)"),
];

/// Display symbol for a currency code, falling back to the code itself.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" | "MXN" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" | "CNY" => "¥",
        "CAD" => "C$",
        "AUD" => "A$",
        "CHF" => "CHF",
        "INR" => "₹",
        "SEK" | "NOK" | "DKK" => "kr",
        "PLN" => "zł",
        "CZK" => "Kč",
        "HUF" => "Ft",
        "BGN" => "лв",
        "RON" => "lei",
        "HRK" => "kn",
        "RUB" => "₽",
        "TRY" => "₺",
        "BRL" => "R$",
        "SGD" => "S$",
        "HKD" => "HK$",
        "KRW" => "₩",
        "ZAR" => "R",
        "NZD" => "NZ$",
        "THB" => "฿",
        "MYR" => "RM",
        "PHP" => "₱",
        "IDR" => "Rp",
        "VND" => "₫",
        other => other,
    }
}

fn eur_fallback_rates() -> RateMapping {
    HashMap::from([
        ("EUR".to_string(), dec!(1.0)),
        ("USD".to_string(), dec!(1.09)),
        ("GBP".to_string(), dec!(0.86)),
        ("CAD".to_string(), dec!(1.48)),
        ("AUD".to_string(), dec!(1.65)),
        ("JPY".to_string(), dec!(157.0)),
        ("CHF".to_string(), dec!(0.96)),
        ("CNY".to_string(), dec!(7.85)),
        ("INR".to_string(), dec!(91.0)),
        ("SEK".to_string(), dec!(11.3)),
        ("NOK".to_string(), dec!(11.8)),
        ("DKK".to_string(), dec!(7.46)),
        ("PLN".to_string(), dec!(4.35)),
        ("CZK".to_string(), dec!(24.7)),
        ("HUF".to_string(), dec!(390.0)),
        ("BGN".to_string(), dec!(1.96)),
        ("RON".to_string(), dec!(4.97)),
        ("HRK".to_string(), dec!(7.53)),
        ("RUB".to_string(), dec!(100.0)),
        ("TRY".to_string(), dec!(32.0)),
        ("BRL".to_string(), dec!(6.15)),
        ("MXN".to_string(), dec!(18.5)),
        ("SGD".to_string(), dec!(1.45)),
        ("HKD".to_string(), dec!(8.5)),
        ("KRW".to_string(), dec!(1450.0)),
        ("ZAR".to_string(), dec!(19.8)),
        ("NZD".to_string(), dec!(1.78)),
        ("THB".to_string(), dec!(38.5)),
        ("MYR".to_string(), dec!(5.0)),
        ("PHP".to_string(), dec!(61.0)),
        ("IDR".to_string(), dec!(16800.0)),
        ("VND".to_string(), dec!(26500.0)),
    ])
}

/// Hardcoded approximate rates, served only when every provider failed and
/// nothing is cached for today.
///
/// The table is anchored at EUR; for another base it is re-based by
/// dividing through the base's EUR rate. An unknown base yields the
/// minimal mapping `{base: 1}`.
pub fn static_fallback_rates(base_currency: &str) -> RateMapping {
    let eur_rates = eur_fallback_rates();
    if base_currency == "EUR" {
        return eur_rates;
    }

    let Some(base_rate) = eur_rates.get(base_currency).copied() else {
        return HashMap::from([(base_currency.to_string(), Decimal::ONE)]);
    };

    let mut rebased: RateMapping = eur_rates
        .into_iter()
        .filter_map(|(code, rate)| rate.checked_div(base_rate).map(|r| (code, r)))
        .collect();
    rebased.insert(base_currency.to_string(), Decimal::ONE);
    rebased
}
