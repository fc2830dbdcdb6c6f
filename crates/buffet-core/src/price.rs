//! # Price Module
//!
//! Provides the `Price` type: a lossless fixed-point currency value with
//! exactly two fractional digits.
//!
//! ## Why Integer Minor Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (tetri, cents, ...)                  │
//! │    "3.5"  ──parse──► 350                                                │
//! │    350    ──format─► "3.50"                                             │
//! │    350 × 2 + 500 = 1200 (exact, no rounding ever happens)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Text Format
//! Accepted: an integer part without leading zeros (a lone `0` is fine),
//! optionally followed by `.` and one or two digits.
//!
//! | Input    | Minor units |
//! |----------|-------------|
//! | `"3"`    | 300         |
//! | `"3.5"`  | 350         |
//! | `"0.05"` | 5           |
//! | `"3.555"`| error       |
//! | `"-1"`   | error       |
//!
//! Values above [`Price::MAX`] are rejected so an order line of 100 units plus
//! a delivery surcharge always fits in `i64`.
//!
//! ## Usage
//! ```rust
//! use buffet_core::price::Price;
//!
//! let unit: Price = "12.00".parse().unwrap();
//! let line = unit * 2;
//! assert_eq!(line.to_string(), "24.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use crate::error::ValidationError;

/// Number of minor units in one major unit.
const MINOR_PER_MAJOR: i64 = 100;

/// Largest value accepted by the parser, in minor units (1,000,000,000,000.00).
const MAX_MINOR: i64 = 100_000_000_000_000;

/// A currency amount stored as a count of minor units.
///
/// ## Design Decisions
/// - **i64 (signed)**: parsing never produces a negative value, but the
///   arithmetic stays total so aggregation code can't panic on a sign flip
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **sqlx transparent**: stored as a plain `INTEGER` column
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Largest price that parses.
    pub const MAX: Price = Price(MAX_MINOR);

    /// Creates a price from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use buffet_core::price::Price;
    ///
    /// let price = Price::from_minor(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Price(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns a zero price.
    #[inline]
    pub const fn zero() -> Self {
        Price(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies the price by an item quantity.
    ///
    /// ## Example
    /// ```rust
    /// use buffet_core::price::Price;
    ///
    /// let line = Price::from_minor(500).multiply_quantity(2);
    /// assert_eq!(line.minor(), 1000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Price(self.0 * qty)
    }

    /// Like [`Price::multiply_quantity`], but `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(minor) => Some(Price(minor)),
            None => None,
        }
    }

    /// Adds two prices, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Price) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(minor) => Some(Price(minor)),
            None => None,
        }
    }
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::invalid_format("price", reason)
}

/// Parses `123`, `123.4` or `123.45` into minor units.
impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (s, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal point"));
        }
        if int_part.len() > 1 && int_part.starts_with('0') {
            return Err(invalid("leading zeros are not allowed"));
        }

        let frac_minor = match frac_part {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(invalid("expected one or two digits after the decimal point"));
                }
                // "5" means fifty minor units, "05" means five
                let digits: i64 = frac.parse().map_err(|_| invalid("bad fraction"))?;
                if frac.len() == 1 {
                    digits * 10
                } else {
                    digits
                }
            }
        };

        let major: i64 = int_part.parse().map_err(|_| invalid("value is too large"))?;
        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .filter(|minor| *minor <= MAX_MINOR)
            .map(Price)
            .ok_or_else(|| invalid("value is too large"))
    }
}

/// Renders `integer.fractional` with exactly two fractional digits.
///
/// No currency symbol is added; callers put the currency code next to it.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            magnitude / MINOR_PER_MAJOR as u64,
            magnitude % MINOR_PER_MAJOR as u64
        )
    }
}

impl Add for Price {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Price(self.0 + other.0)
    }
}

impl AddAssign for Price {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Price {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Price(self.0 * qty)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Self {
        iter.fold(Price::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Price> for Price {
    fn sum<I: Iterator<Item = &'a Price>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Price, ValidationError> {
        s.parse()
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse("3.5").unwrap().minor(), 350);
        assert_eq!(parse("3").unwrap().minor(), 300);
        assert_eq!(parse("0.05").unwrap().minor(), 5);
        assert_eq!(parse("0").unwrap().minor(), 0);
        assert_eq!(parse("0.5").unwrap().minor(), 50);
        assert_eq!(parse("12.34").unwrap().minor(), 1234);
        assert_eq!(parse("100").unwrap().minor(), 10000);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "", "3.555", "-1", "+1", "01", "00", "1.", ".5", "1.2.3", "1,50", "abc", " 1", "1 ",
            "1.a", "١",
        ] {
            assert!(
                matches!(parse(bad), Err(ValidationError::InvalidFormat { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse("92233720368547759").is_err());
        assert!(parse("99999999999999999999").is_err());
        assert!(parse("92233720368547758.07").is_err());
    }

    #[test]
    fn test_parse_upper_bound() {
        assert_eq!(parse("1000000000000").unwrap(), Price::MAX);
        assert_eq!(parse("999999999999.99").unwrap().minor(), MAX_MINOR - 1);
        assert!(matches!(
            parse("1000000000000.01"),
            Err(ValidationError::InvalidFormat { .. })
        ));

        // Largest line plus the largest surcharge still fits
        let line = Price::MAX.checked_multiply_quantity(100).unwrap();
        assert!(line.checked_add(Price::MAX).is_some());
    }

    #[test]
    fn test_checked_arithmetic() {
        let near_max = Price::from_minor(i64::MAX - 1);
        assert_eq!(near_max.checked_multiply_quantity(2), None);
        assert_eq!(near_max.checked_add(Price::from_minor(500)), None);
        assert_eq!(
            Price::from_minor(350).checked_multiply_quantity(2),
            Some(Price::from_minor(700))
        );
        assert_eq!(
            near_max.checked_add(Price::from_minor(1)),
            Some(Price::from_minor(i64::MAX))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_minor(5).to_string(), "0.05");
        assert_eq!(Price::from_minor(50).to_string(), "0.50");
        assert_eq!(Price::from_minor(100).to_string(), "1.00");
        assert_eq!(Price::from_minor(1099).to_string(), "10.99");
        assert_eq!(Price::from_minor(0).to_string(), "0.00");
        assert_eq!(Price::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Price::from_minor(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_format_then_parse_is_identity() {
        for minor in [0, 1, 9, 10, 99, 100, 101, 350, 1234, 999_999, MAX_MINOR] {
            let price = Price::from_minor(minor);
            let text = price.to_string();
            assert_eq!(text.matches('.').count(), 1);
            assert_eq!(text.split('.').nth(1).map(str::len), Some(2));
            assert_eq!(parse(&text).unwrap(), price);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Price::from_minor(1000);
        let b = Price::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!(a.multiply_quantity(0), Price::zero());

        let mut total = Price::zero();
        total += a;
        total += b;
        assert_eq!(total.minor(), 1500);

        let summed: Price = [a, b, b].iter().sum();
        assert_eq!(summed.minor(), 2000);
    }

    #[test]
    fn test_parts() {
        let price = Price::from_minor(1099);
        assert_eq!(price.major(), 10);
        assert_eq!(price.minor_part(), 99);

        let negative = Price::from_minor(-550);
        assert_eq!(negative.major(), -5);
        assert_eq!(negative.minor_part(), 50);
        assert!(negative.is_negative());
        assert!(Price::zero().is_zero());
    }

    #[test]
    fn test_serde_is_plain_integer() {
        let json = serde_json::to_string(&Price::from_minor(350)).unwrap();
        assert_eq!(json, "350");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back.minor(), 350);
    }
}
