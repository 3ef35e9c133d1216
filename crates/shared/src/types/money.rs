//! Currency codes and cent rounding helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` throughout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount or balance a `NUMERIC(15,2)` column holds: 9 999 999 999 999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, MONEY_SCALE);

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Russian Ruble
    #[default]
    Rub,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Returns the ISO code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rub => "RUB",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

/// Rounds to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if the value has no digits beyond the cent.
#[must_use]
pub fn has_cent_precision(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RUB" => Ok(Self::Rub),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_default_currency_is_rub() {
        assert_eq!(Currency::default(), Currency::Rub);
    }

    #[rstest]
    #[case("RUB", Currency::Rub)]
    #[case("rub", Currency::Rub)]
    #[case("Usd", Currency::Usd)]
    #[case("EUR", Currency::Eur)]
    fn test_currency_from_str(#[case] input: &str, #[case] expected: Currency) {
        assert_eq!(Currency::from_str(input).unwrap(), expected);
        assert_eq!(expected.to_string(), input.to_uppercase());
    }

    #[test]
    fn test_currency_rejects_unknown() {
        assert!(Currency::from_str("IDR").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(7), dec!(7))]
    fn test_round_money(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn test_max_amount_fits_numeric_15_2() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999999.99));
        assert_eq!(MAX_AMOUNT.scale(), MONEY_SCALE);
    }

    #[rstest]
    #[case(dec!(100), true)]
    #[case(dec!(100.50), true)]
    #[case(dec!(100.500), true)]
    #[case(dec!(0.01), true)]
    #[case(dec!(0.001), false)]
    #[case(dec!(12.345), false)]
    fn test_cent_precision(#[case] input: Decimal, #[case] expected: bool) {
        assert_eq!(has_cent_precision(input), expected);
    }
}
