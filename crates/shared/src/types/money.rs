//! Fixed-point money helpers.
//!
//! Never use floating-point for money. Amounts are `rust_decimal::Decimal`
//! with at most [`AMOUNT_SCALE`] fractional digits.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Fractional digits kept for money amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Fractional digits kept for beneficiary ratios.
pub const RATIO_SCALE: u32 = 10;

/// Largest storable money amount: money columns are `DECIMAL(19, 4)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, 4);

/// Balances within this distance of zero count as settled.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns true if `amount` is within [`BALANCE_TOLERANCE`] of zero.
#[must_use]
pub fn is_settled(amount: Decimal) -> bool {
    amount.abs() <= BALANCE_TOLERANCE
}

/// Returns true if `amount` has no more than [`AMOUNT_SCALE`] significant fractional digits.
#[must_use]
pub fn fits_amount_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= AMOUNT_SCALE
}

/// Returns true if `amount` fits a money column: at most [`AMOUNT_SCALE`]
/// fractional digits and no larger in magnitude than [`MAX_AMOUNT`].
#[must_use]
pub fn is_storable_amount(amount: Decimal) -> bool {
    fits_amount_scale(amount) && amount.abs() <= MAX_AMOUNT
}

/// Rounds to two digits for display, banker's rounding.
#[must_use]
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// ISO 4217 style currency code: three uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

/// Error returned for a malformed currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("currency code must be three letters, got {0:?}")]
pub struct InvalidCurrencyCode(pub String);

impl CurrencyCode {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
    }

    #[test]
    fn test_is_settled() {
        assert!(is_settled(dec!(0)));
        assert!(is_settled(dec!(0.01)));
        assert!(is_settled(dec!(-0.01)));
        assert!(!is_settled(dec!(0.0101)));
        assert!(!is_settled(dec!(-5)));
    }

    #[test]
    fn test_fits_amount_scale() {
        assert!(fits_amount_scale(dec!(12.3456)));
        assert!(fits_amount_scale(dec!(12.345600)));
        assert!(!fits_amount_scale(dec!(12.34567)));
    }

    #[test]
    fn test_max_amount_matches_column_precision() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999999.9999));
        assert!(is_storable_amount(MAX_AMOUNT));
        assert!(is_storable_amount(dec!(-250.5)));
        assert!(!is_storable_amount(dec!(1000000000000000)));
        assert!(!is_storable_amount(dec!(10000000000000000)));
        assert!(!is_storable_amount(dec!(1.00001)));
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(CurrencyCode::from_str("vnd").unwrap().as_str(), "VND");
        assert!(CurrencyCode::from_str("US").is_err());
        assert!(CurrencyCode::from_str("U5D").is_err());
        assert!(serde_json::from_str::<CurrencyCode>("\"EURO\"").is_err());
    }
}
