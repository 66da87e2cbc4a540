//! Exact decimal money amounts.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// A monetary amount with exact decimal precision.
///
/// Backed by a 96-bit decimal so that repeated additions and subtractions
/// never drift the way binary floating point does. The scale of the input
/// is preserved: `"500.00"` displays as `500.00`, and `1000.45` survives
/// any number of store/load cycles unchanged.
///
/// Serialized as a JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Wraps an existing decimal.
    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates an amount from a whole number of minor units (cents).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Creates an amount from a double-precision number.
    ///
    /// The float is converted through its shortest round-trip decimal text,
    /// so `1000.45_f64` becomes exactly `1000.45` rather than the nearest
    /// binary fraction.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_amount(
                value.to_string(),
                "not a finite number",
            ));
        }
        value.to_string().parse()
    }

    /// Validates that the amount is not negative.
    ///
    /// Transaction amounts are magnitudes; the direction of the movement is
    /// carried by the transaction type.
    pub fn non_negative(self) -> Result<Self> {
        if self.is_negative() {
            return Err(DomainError::invalid_amount(
                self.to_string(),
                "must not be negative",
            ));
        }
        Ok(self)
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Adds another amount, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts another amount, returning `None` on overflow.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Adds another amount.
    ///
    /// # Panics
    ///
    /// Panics if the sum overflows [`Decimal`]. Use [`Money::checked_add`]
    /// for amounts that come from outside the process.
    pub fn add(&self, other: Money) -> Money {
        Money(self.0 + other.0)
    }

    /// Subtracts another amount.
    ///
    /// # Panics
    ///
    /// Panics if the difference overflows [`Decimal`]. Use
    /// [`Money::checked_sub`] for amounts that come from outside the process.
    pub fn subtract(&self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses a plain decimal literal such as `"1000.45"` or `"-12"`.
    ///
    /// Inputs that cannot be represented without rounding are rejected.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(DomainError::invalid_amount(s, "empty input"));
        }
        Decimal::from_str_exact(s)
            .map(Money)
            .map_err(|_| DomainError::invalid_amount(s, "not a decimal number"))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

// The operator impls panic on overflow like `Decimal`'s own; the projection
// engine goes through `checked_add`.
impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
