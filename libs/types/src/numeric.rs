//! Exact decimal types for prices and quantities
//!
//! Wraps `rust_decimal` so every price and quantity on the book is exact
//! decimal arithmetic, never floating point. Both types serialize as JSON
//! strings to prevent number precision loss on the wire.
//!
//! Rounding: the only rounding the book ever performs is the
//! market-by-notional quantity computation, which rounds half away from zero
//! at the caller-supplied scale (see [`Price::quantity_for_notional`]).
//! Everything else is exact as representable in 96-bit decimal.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Price of one unit, strictly positive.
///
/// Ordered and hashable so it can key the per-side level maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the value is zero or negative
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None unless the value is positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from an integer (tests and seeding)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from a decimal string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Quantity purchasable for `notional` at this price, rounded half away
    /// from zero at `scale` decimal places.
    ///
    /// A scale too coarse to express one quantum at this price rounds to
    /// zero, which the notional matching loop treats as a stop condition.
    pub fn quantity_for_notional(&self, notional: Decimal, scale: u32) -> Decimal {
        (notional / self.0).round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
    }
}

// String serialization preserves exact decimal digits.
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity of units, never negative.
///
/// A resting order always carries a strictly positive quantity
/// ([`Quantity::try_new`] enforces this); [`Quantity::ZERO`] exists for fill
/// accounting and aggregate volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// The zero quantity
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Create a new Quantity from a Decimal
    ///
    /// # Panics
    /// Panics if the value is zero or negative
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "quantity must be positive");
        Self(value)
    }

    /// Try to create a Quantity, returning None unless the value is positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from an integer (tests and seeding)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from a decimal string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check whether the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "quantity subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        assert!(self.0 >= rhs.0, "quantity subtraction would go negative");
        self.0 -= rhs.0;
    }
}

/// Notional value of `quantity` at `price`, in price units.
impl std::ops::Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

// Aggregate volumes deserialize from snapshots, where zero never appears in
// practice but is structurally valid; order quantities are re-checked by the
// snapshot decoder.
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        if decimal >= Decimal::ZERO {
            Ok(Self(decimal))
        } else {
            Err(serde::de::Error::custom("quantity cannot be negative"))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(100);
        assert_eq!(price.as_decimal(), Decimal::from(100));
    }

    #[test]
    #[should_panic(expected = "price must be positive")]
    fn test_price_zero_panics() {
        Price::new(Decimal::ZERO);
    }

    #[test]
    fn test_price_try_new() {
        assert!(Price::try_new(Decimal::from(1)).is_some());
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-5)).is_none());
    }

    #[test]
    fn test_price_ordering() {
        assert!(Price::from_u64(100) < Price::from_u64(110));
        assert_eq!(
            Price::from_str("100.0").unwrap(),
            Price::from_u64(100),
            "numerically equal prices compare equal regardless of scale"
        );
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("50000.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"50000.25\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_price_rejects_nonpositive_on_decode() {
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }

    #[test]
    fn test_quantity_for_notional_rounding() {
        let price = Price::from_str("0.01").unwrap();
        let q = price.quantity_for_notional(Decimal::from_str("0.001").unwrap(), 8);
        assert_eq!(q, Decimal::from_str("0.1").unwrap());

        // Scale too coarse for one quantum at this price rounds to zero.
        let high = Price::from_u64(1000);
        let q = high.quantity_for_notional(Decimal::from_str("0.4").unwrap(), 0);
        assert_eq!(q, Decimal::ZERO);

        // Half-way cases round away from zero.
        let q = high.quantity_for_notional(Decimal::from_str("500").unwrap(), 0);
        assert_eq!(q, Decimal::from(1));
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::from_str("2.5").unwrap();
        let q2 = Quantity::from_str("1.5").unwrap();

        assert_eq!((q1 + q2).as_decimal(), Decimal::from(4));
        assert_eq!((q1 - q2).as_decimal(), Decimal::from(1));

        let mut acc = Quantity::ZERO;
        acc += q1;
        acc -= q2;
        assert_eq!(acc.as_decimal(), Decimal::from(1));
    }

    #[test]
    #[should_panic(expected = "quantity subtraction would go negative")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::from_u64(1) - Quantity::from_u64(2);
    }

    #[test]
    fn test_quantity_notional() {
        let qty = Quantity::from_str("1.5").unwrap();
        let price = Price::from_u64(100);
        assert_eq!(qty * price, Decimal::from(150));
    }

    #[test]
    fn test_quantity_zero() {
        assert!(Quantity::ZERO.is_zero());
        assert!(!Quantity::from_u64(1).is_zero());
    }

    #[test]
    fn test_quantity_decode_accepts_zero_rejects_negative() {
        assert!(serde_json::from_str::<Quantity>("\"0\"").is_ok());
        assert!(serde_json::from_str::<Quantity>("\"-1\"").is_err());
    }
}
