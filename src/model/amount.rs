//! Amount type for monetary values.
//!
//! The persisted document stores money as plain JSON numbers. In memory we hold a `Decimal` so
//! that sums in the profit/loss report do not pick up floating point noise.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Represents a money amount.
///
/// Parsing accepts `.` or `,` as the decimal separator, and the other one as a thousands separator
/// when both are present:
///
/// ```
/// # use haulbook::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1.234,50").unwrap();
/// let b = Amount::from_str("1,234.50").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "1234.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// `None` when the sum leaves the range of `Decimal`.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Adds up `amounts`, or `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Amount>) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error(transparent)]
    Invalid(#[from] rust_decimal::Error),

    /// The document stores numbers as JSON doubles, which cannot hold this value exactly.
    #[error("{0} has more significant digits than the data file can store")]
    TooPrecise(Decimal),
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Amount)
    }
}

/// Whether `value` comes back unchanged after being written as a JSON number and read again.
fn fits_json_number(value: Decimal) -> bool {
    value
        .to_f64()
        .and_then(|f| Decimal::from_str(&f.to_string()).ok())
        == Some(value)
}

fn exact(value: Decimal) -> Result<Decimal, AmountError> {
    if fits_json_number(value) {
        Ok(value)
    } else {
        Err(AmountError::TooPrecise(value))
    }
}

/// Parses a decimal that may use a comma as decimal separator, e.g. `12,50` or `1.000,00`.
/// Values that would not survive a save and load are rejected.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, AmountError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let normalized = match (trimmed.rfind(','), trimmed.rfind('.')) {
        // The separator that comes last is the decimal separator.
        (Some(comma), Some(dot)) if comma > dot => trimmed.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => trimmed.replace(',', ""),
        (Some(_), None) => trimmed.replace(',', "."),
        _ => trimmed.to_string(),
    };
    exact(Decimal::from_str(&normalized)?)
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0.round_dp(2))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        number::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        number::deserialize(deserializer).map(Amount)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Serde helpers that write a `Decimal` as a JSON number and read it back from a number or a
/// string. Use with `#[serde(with = "crate::model::number")]`.
pub mod number {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::de::{Error, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::str::FromStr;

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => Err(serde::ser::Error::custom(format!(
                "{value} cannot be represented as a JSON number"
            ))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<Decimal, E> {
            super::exact(Decimal::from(v)).map_err(E::custom)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<Decimal, E> {
            super::exact(Decimal::from(v)).map_err(E::custom)
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<Decimal, E> {
            // `f64`'s Display is the shortest representation that round trips, so 0.1 stays 0.1.
            Decimal::from_str(&v.to_string()).map_err(E::custom)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Decimal, E> {
            super::parse_decimal(v).map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain_and_comma_decimal() {
        assert_eq!(Amount::from_str("150.00").unwrap().value(), dec("150"));
        assert_eq!(Amount::from_str("150,25").unwrap().value(), dec("150.25"));
        assert_eq!(Amount::from_str("  -12.5 ").unwrap().value(), dec("-12.5"));
        assert_eq!(Amount::from_str("").unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_parse_thousands_separators() {
        assert_eq!(Amount::from_str("1.000.000,01").unwrap().value(), dec("1000000.01"));
        assert_eq!(Amount::from_str("1,000,000.01").unwrap().value(), dec("1000000.01"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("twelve").is_err());
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Amount::new(dec("150")).to_string(), "150.00");
        assert_eq!(Amount::new(dec("-0.5")).to_string(), "-0.50");
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Amount::new(dec("150.5"))).unwrap();
        assert_eq!(json, "150.5");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let a: Amount = serde_json::from_str("0.1").unwrap();
        assert_eq!(a.value(), dec("0.1"));
        let b: Amount = serde_json::from_str("100").unwrap();
        assert_eq!(b.value(), dec("100"));
        let c: Amount = serde_json::from_str("\"99,90\"").unwrap();
        assert_eq!(c.value(), dec("99.9"));
        assert!(serde_json::from_str::<Amount>("true").is_err());
    }

    #[test]
    fn test_sum_and_sub() {
        let total = Amount::checked_sum(
            ["0.1", "0.2", "0.3"]
                .iter()
                .map(|s| Amount::from_str(s).unwrap()),
        )
        .unwrap();
        assert_eq!(total.value(), dec("0.6"));
        assert!(Amount::ZERO.checked_sub(total).unwrap().is_negative());
    }

    #[test]
    fn test_overflow_is_none() {
        let big = Amount::new(dec("50000000000000000000000000000"));
        assert!(big.checked_add(big).is_none());
        assert!(Amount::checked_sum([big, big]).is_none());
        assert!(Amount::ZERO.checked_sub(big).unwrap().checked_sub(big).is_none());
    }

    #[test]
    fn test_reject_more_digits_than_a_double_holds() {
        assert!(matches!(
            Amount::from_str("12345678901234567.89"),
            Err(AmountError::TooPrecise(_))
        ));
        assert!(serde_json::from_str::<Amount>("\"12345678901234567.89\"").is_err());
        assert!(serde_json::from_str::<Amount>("12345678901234567891").is_err());
        // Fifteen significant digits still fit.
        assert!(Amount::from_str("1234567890123.45").is_ok());
    }

    #[test]
    fn test_accepted_amounts_survive_json() {
        for s in ["0.1", "1234567890123.45", "-99.99", "50000000000000000000000000000"] {
            let a = Amount::from_str(s).unwrap();
            let back: Amount = serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
            assert_eq!(back, a, "{s}");
        }
    }
}
