//! # Wardbook Types
//!
//! Validated leaf types shared across the wardbook crates.
//!
//! These types make invalid values unrepresentable at the edges of the
//! system: `NonEmptyText` for names and labels, `Money` for non-negative
//! monetary amounts. Construction validates; everything downstream can rely
//! on the guarantee without re-checking.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is automatically trimmed of leading
/// and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating or combining `Money` values.
#[derive(Debug, thiserror::Error)]
pub enum MoneyError {
    /// Monetary amounts must be zero or positive
    #[error("Money cannot be negative")]
    Negative,
    /// The input was not a finite representable number
    #[error("Money must be a finite number")]
    NotFinite,
    /// Addition or multiplication overflowed the decimal range
    #[error("Money arithmetic overflowed")]
    Overflow,
}

/// A non-negative monetary amount.
///
/// Backed by an exact decimal so arithmetic never accumulates binary
/// floating-point error. Serializes as a JSON number to match the persisted
/// document shapes (`costPerDay`, `totalAmount`, `unitCost`, `totalCost`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new `Money` from a decimal amount.
    ///
    /// Returns `MoneyError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Creates a `Money` from a whole number of currency units.
    pub fn from_major(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds another amount, failing on decimal overflow.
    pub fn checked_add(&self, other: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// Multiplies the amount by a whole quantity, failing on overflow.
    pub fn times(&self, quantity: u32) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("money amount is not representable"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> serde::Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        let amount = Decimal::from_f64(raw)
            .ok_or_else(|| serde::de::Error::custom(MoneyError::NotFinite))?;
        Money::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        let text = NonEmptyText::new("  Ward A  ").unwrap();
        assert_eq!(text.as_str(), "Ward A");

        assert!(NonEmptyText::new("").is_err());
        assert!(NonEmptyText::new("   \t ").is_err());
    }

    #[test]
    fn money_rejects_negative_amounts() {
        assert!(Money::new(Decimal::from(-1)).is_err());
        assert!(Money::new(Decimal::ZERO).is_ok());
        assert!(Money::new(Decimal::from(1500)).is_ok());
    }

    #[test]
    fn money_times_quantity() {
        let rate = Money::from_major(1500);
        let total = rate.times(2).unwrap();
        assert_eq!(total.amount(), Decimal::from(3000));
    }

    #[test]
    fn money_serializes_as_json_number() {
        let rate = Money::from_major(1500);
        let json = serde_json::to_value(rate).unwrap();
        assert_eq!(json, serde_json::json!(1500.0));

        let back: Money = serde_json::from_value(json).unwrap();
        assert_eq!(back, rate);
    }

    #[test]
    fn money_deserialize_rejects_negative() {
        let err = serde_json::from_value::<Money>(serde_json::json!(-10.0));
        assert!(err.is_err());
    }
}
