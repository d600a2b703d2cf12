//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! All monetary values in the system are integer cents. The database stores
//! cents, the API transports cents, and only the storefront converts to a
//! display string. `1099` cents is €10.99.
//!
//! ## Usage
//! ```rust
//! use libreria_core::money::Money;
//!
//! // Create from cents (the only way in)
//! let price = Money::from_cents(1099); // €10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                      // €21.98
//! let total = price + Money::from_cents(500);   // €15.99
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// - `i64` (signed): allows negative values for refunds and discounts
/// - Single-field tuple struct: zero-cost abstraction over i64
/// - Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (euros) portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use libreria_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1250); // €12.50
    /// let line_subtotal = unit_price.multiply_quantity(3);
    /// assert_eq!(line_subtotal.cents(), 3750); // €37.50
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the given percentage of this amount, rounded half-up.
    ///
    /// ## Arguments
    /// * `pct` - Whole percent (10 = 10%)
    ///
    /// ## Implementation
    /// Integer math with i128 to prevent overflow on large amounts:
    /// `(amount * pct + 50) / 100`; the +50 provides rounding.
    ///
    /// ## Example
    /// ```rust
    /// use libreria_core::money::Money;
    ///
    /// let total = Money::from_cents(10000); // €100.00
    /// assert_eq!(total.percentage_of(15).cents(), 1500); // €15.00
    /// ```
    pub fn percentage_of(&self, pct: i64) -> Money {
        let amount = (self.0 as i128 * pct as i128 + 50) / 100;
        Money::from_cents(amount as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `pct` - Discount in whole percent (10 = 10% off)
    ///
    /// ## Example
    /// ```rust
    /// use libreria_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // €100.00
    /// let discounted = subtotal.apply_percentage_discount(10);
    /// assert_eq!(discounted.cents(), 9000); // €90.00
    /// ```
    pub fn apply_percentage_discount(&self, pct: i64) -> Money {
        *self - self.percentage_of(pct)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for debugging and logs. The storefront handles localized
/// formatting for actual display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.euros(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "€10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "€5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(1250);
        let subtotal = unit_price.multiply_quantity(3);
        assert_eq!(subtotal.cents(), 3750);
    }

    #[test]
    fn test_percentage_of() {
        let total = Money::from_cents(10000);
        assert_eq!(total.percentage_of(15).cents(), 1500);
        assert_eq!(total.percentage_of(0).cents(), 0);
        assert_eq!(total.percentage_of(100).cents(), 10000);
    }

    #[test]
    fn test_percentage_rounding() {
        // €0.99 at 33% = 32.67 cents → rounds to 33
        let amount = Money::from_cents(99);
        assert_eq!(amount.percentage_of(33).cents(), 33);

        // €0.10 at 25% = 2.5 cents → rounds half-up to 3
        let amount = Money::from_cents(10);
        assert_eq!(amount.percentage_of(25).cents(), 3);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000); // €100.00
        let discounted = subtotal.apply_percentage_discount(10);
        assert_eq!(discounted.cents(), 9000); // €90.00

        // 100% discount is free, never negative
        assert_eq!(subtotal.apply_percentage_discount(100).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
