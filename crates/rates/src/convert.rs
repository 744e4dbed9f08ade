//! Stateless monetary conversion over a base-anchored rate mapping.
//!
//! All arithmetic is `Decimal` (96-bit mantissa, 28–29 significant digits);
//! nothing here goes through binary floating point. Conversion sits in
//! cost-display paths, so missing or unusable rates fail soft: the amount
//! comes back unconverted instead of an error breaking rendering.

use log::warn;
use rust_decimal::Decimal;

use crate::models::RateMapping;

/// Normalize a raw rate mapping for use with [`convert_amount`].
///
/// Drops non-positive entries (a zero or negative rate is unusable and
/// would poison chained conversions) and forces the base currency to
/// exactly `1` whether or not the source supplied it.
pub fn normalize_rates(mut rates: RateMapping, base_currency: &str) -> RateMapping {
    rates.retain(|code, rate| {
        if rate.is_sign_negative() || rate.is_zero() {
            warn!("Dropping unusable rate {} = {}", code, rate);
            false
        } else {
            true
        }
    });
    rates.insert(base_currency.to_string(), Decimal::ONE);
    rates
}

/// Convert an amount between two currency codes using a mapping anchored
/// at `base_currency`.
///
/// The amount is first normalized into the base currency, then projected
/// into the target. Identity conversions short-circuit without touching
/// the mapping. A missing or zero rate for either side returns the
/// original amount unchanged.
pub fn convert_amount(
    amount: Decimal,
    from_currency: &str,
    to_currency: &str,
    rates: &RateMapping,
    base_currency: &str,
) -> Decimal {
    if from_currency == to_currency {
        return amount;
    }

    let amount_in_base = if from_currency == base_currency {
        amount
    } else {
        let Some(from_rate) = usable_rate(rates, from_currency) else {
            return amount;
        };
        match amount.checked_div(from_rate) {
            Some(v) => v,
            None => return amount,
        }
    };

    if to_currency == base_currency {
        return amount_in_base;
    }

    let Some(to_rate) = usable_rate(rates, to_currency) else {
        return amount;
    };

    match amount_in_base.checked_mul(to_rate) {
        Some(v) => v,
        None => amount,
    }
}

fn usable_rate(rates: &RateMapping, currency: &str) -> Option<Decimal> {
    match rates.get(currency) {
        Some(rate) if !rate.is_zero() && !rate.is_sign_negative() => Some(*rate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn eur_rates() -> RateMapping {
        HashMap::from([
            ("EUR".to_string(), dec!(1)),
            ("USD".to_string(), dec!(1.10)),
            ("GBP".to_string(), dec!(0.85)),
        ])
    }

    #[test]
    fn test_identity_conversion_is_exact() {
        let rates = eur_rates();
        assert_eq!(
            convert_amount(dec!(123.456789), "USD", "USD", &rates, "EUR"),
            dec!(123.456789)
        );
        // Identity holds even for currencies absent from the mapping.
        assert_eq!(
            convert_amount(dec!(42), "XYZ", "XYZ", &rates, "EUR"),
            dec!(42)
        );
    }

    #[test]
    fn test_base_currency_pivot() {
        let rates = eur_rates();
        let result = convert_amount(dec!(100), "USD", "GBP", &rates, "EUR");
        let expected = dec!(100) / dec!(1.10) * dec!(0.85);
        assert_eq!(result, expected);
        // Sanity on the magnitude: 100 / 1.10 * 0.85 ≈ 77.2727...
        assert!((result - dec!(77.2727272727)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_from_base_and_to_base() {
        let rates = eur_rates();
        assert_eq!(
            convert_amount(dec!(100), "EUR", "USD", &rates, "EUR"),
            dec!(110.00)
        );
        assert_eq!(
            convert_amount(dec!(110), "USD", "EUR", &rates, "EUR"),
            dec!(110) / dec!(1.10)
        );
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let rates = eur_rates();
        let amount = dec!(250.17);
        let there = convert_amount(amount, "USD", "GBP", &rates, "EUR");
        let back = convert_amount(there, "GBP", "USD", &rates, "EUR");
        assert!((back - amount).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_missing_rate_fails_soft() {
        let rates: RateMapping = HashMap::from([("EUR".to_string(), dec!(1))]);
        assert_eq!(
            convert_amount(dec!(50), "EUR", "XYZ", &rates, "EUR"),
            dec!(50)
        );
        assert_eq!(
            convert_amount(dec!(50), "XYZ", "EUR", &rates, "EUR"),
            dec!(50)
        );
    }

    #[test]
    fn test_zero_rate_fails_soft() {
        let mut rates = eur_rates();
        rates.insert("JPY".to_string(), Decimal::ZERO);
        assert_eq!(
            convert_amount(dec!(50), "JPY", "EUR", &rates, "EUR"),
            dec!(50)
        );
        assert_eq!(
            convert_amount(dec!(50), "EUR", "JPY", &rates, "EUR"),
            dec!(50)
        );
    }

    #[test]
    fn test_normalize_forces_base_and_drops_unusable() {
        let raw: RateMapping = HashMap::from([
            ("USD".to_string(), dec!(1.10)),
            ("JPY".to_string(), Decimal::ZERO),
            ("GBP".to_string(), dec!(-0.85)),
        ]);
        let normalized = normalize_rates(raw, "EUR");
        assert_eq!(normalized["EUR"], Decimal::ONE);
        assert_eq!(normalized["USD"], dec!(1.10));
        assert!(!normalized.contains_key("JPY"));
        assert!(!normalized.contains_key("GBP"));
    }

    #[test]
    fn test_normalize_overrides_source_base_value() {
        let raw: RateMapping = HashMap::from([("EUR".to_string(), dec!(0.999999))]);
        let normalized = normalize_rates(raw, "EUR");
        assert_eq!(normalized["EUR"], Decimal::ONE);
    }
}
