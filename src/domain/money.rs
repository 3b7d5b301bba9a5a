use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Represents a monetary value.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific
/// rules and provide type safety for price arithmetic. Amounts may be negative
/// mid-computation (e.g. after subtracting a voucher discount); persisted order
/// totals are validated to be non-negative at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies by a line quantity.
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Clamps the value into `[min, max]`.
    pub fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

/// A positive monetary amount, used for unit prices.
///
/// Ensures catalog prices snapshotted onto order lines are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::validation("unit price must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitPrice> for Money {
    fn from(price: UnitPrice) -> Self {
        Self(price.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(10000));
        let b = Money::new(dec!(2500));
        assert_eq!(a + b, Money::new(dec!(12500)));
        assert_eq!(a - b, Money::new(dec!(7500)));
        assert_eq!(b.times(3), Money::new(dec!(7500)));
    }

    #[test]
    fn test_money_clamp() {
        let min = Money::new(dec!(5000));
        let max = Money::new(dec!(50000));
        assert_eq!(Money::new(dec!(1000)).clamp(min, max), min);
        assert_eq!(Money::new(dec!(99000)).clamp(min, max), max);
        assert_eq!(Money::new(dec!(20000)).clamp(min, max), Money::new(dec!(20000)));
    }

    #[test]
    fn test_unit_price_validation() {
        assert!(UnitPrice::new(dec!(1.0)).is_ok());
        assert!(matches!(
            UnitPrice::new(dec!(0.0)),
            Err(CheckoutError::Validation(_))
        ));
        assert!(matches!(
            UnitPrice::new(dec!(-5.0)),
            Err(CheckoutError::Validation(_))
        ));
    }
}
