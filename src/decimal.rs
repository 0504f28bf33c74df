//! Fixed-point monetary type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement. External amounts are
//! truncated (never rounded) to 2 places; computed amounts such as interest
//! are rounded half-up at the final step via [`Money::round_half_up`].

use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// A monetary value that maintains exactly 2 decimal places of precision.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use term_ledger::Money;
///
/// let amount = Money::from_str("10.579").unwrap();
/// assert_eq!(amount.to_string(), "10.57");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money` from a `Decimal`, truncating toward zero to 2 places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::ToZero);
        normalized.rescale(Self::SCALE);
        Money(normalized)
    }

    /// Creates a new `Money` from a `Decimal`, rounding half-up to 2 places.
    ///
    /// Used for computed amounts only; caller-supplied amounts go through [`Money::new`].
    pub fn round_half_up(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Money(rounded)
    }

    /// Creates a value from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, Self::SCALE))
    }

    /// Parses a caller-supplied amount that must be strictly positive.
    ///
    /// Fails with [`LedgerError::InvalidAmount`] when the text is not a number
    /// or when the truncated value is zero or negative.
    pub fn parse_amount(s: &str) -> Result<Self> {
        let amount =
            Money::from_str(s).map_err(|_| LedgerError::InvalidAmount(s.trim().to_string()))?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(s.trim().to_string()));
        }
        Ok(amount)
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns `true` if this value is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Money::new(decimal))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(Money::from_str("1").unwrap().to_string(), "1.00");
        assert_eq!(Money::from_str("1.5").unwrap().to_string(), "1.50");
        assert_eq!(Money::from_str("  2.25  ").unwrap().to_string(), "2.25");
    }

    #[test]
    fn test_from_str_truncates_instead_of_rounding() {
        assert_eq!(Money::from_str("10.019").unwrap().to_string(), "10.01");
        assert_eq!(Money::from_str("10.999").unwrap().to_string(), "10.99");
        assert_eq!(Money::from_str("-3.339").unwrap().to_string(), "-3.33");
    }

    #[test]
    fn test_round_half_up() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(Money::round_half_up(d("0.125")).to_string(), "0.13");
        assert_eq!(Money::round_half_up(d("0.1249")).to_string(), "0.12");
        assert_eq!(Money::round_half_up(d("7")).to_string(), "7.00");
    }

    #[test]
    fn test_parse_amount_rejects_non_positive_and_malformed() {
        assert!(Money::parse_amount("12.34").is_ok());
        assert!(matches!(
            Money::parse_amount("0"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::parse_amount("0.009"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::parse_amount("-5"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::parse_amount("ten"),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = Money::from_str("1.5").unwrap();
        let b = Money::from_str("2.5").unwrap();

        assert_eq!((a + b).to_string(), "4.00");
        assert_eq!((b - a).to_string(), "1.00");
        assert_eq!(vec![a, b, a].into_iter().sum::<Money>().to_string(), "5.50");
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1025).to_string(), "10.25");
        assert!(Money::ZERO.is_zero());
    }
}
