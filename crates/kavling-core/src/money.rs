//! # Money Module
//!
//! Provides the `Money` type for rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A 1.000.000 installment paid as 333.333,33 three times:               │
//! │    333333.33 * 3 = 999999.99  → "partial" forever                      │
//! │                                                                         │
//! │  OUR SOLUTION: Whole Rupiah                                             │
//! │    Every amount is an i64 count of rupiah. Comparisons like            │
//! │    "paid_amount == amount" are exact, no tolerance needed.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Files written by older tooling may hold fractional JSON numbers. Those are
//! rounded to the nearest rupiah when decoded; new writes are always integers.
//!
//! ## Usage
//! ```rust
//! use kavling_core::money::Money;
//!
//! let dp = Money::from_rupiah(5_000_000);
//! let paid = Money::from_rupiah(3_000_000);
//! assert_eq!((dp - paid).rupiah(), 2_000_000);
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole rupiah.
///
/// ## Design Decisions
/// - **i64 (signed)**: remaining balances are computed by subtraction and
///   may go negative before being clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Lenient decode**: accepts JSON integers and floats (rounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    /// Returns the value in rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Zero rupiah.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `self - other`, clamped at zero.
    ///
    /// Used for "remaining" figures, which are never reported as negative.
    ///
    /// ```rust
    /// use kavling_core::money::Money;
    ///
    /// let due = Money::from_rupiah(100);
    /// assert_eq!(due.remaining_after(Money::from_rupiah(30)).rupiah(), 70);
    /// assert_eq!(due.remaining_after(Money::from_rupiah(130)).rupiah(), 0);
    /// ```
    #[inline]
    pub fn remaining_after(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Takes a share expressed in basis points, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, computed in i128 so
    /// large loan amounts cannot overflow.
    ///
    /// ```rust
    /// use kavling_core::money::Money;
    ///
    /// // 10% of 1.000.000
    /// assert_eq!(Money::from_rupiah(1_000_000).percent_bps(1000).rupiah(), 100_000);
    /// // 10% of 5 = 0.5 → 1
    /// assert_eq!(Money::from_rupiah(5).percent_bps(1000).rupiah(), 1);
    /// ```
    pub fn percent_bps(&self, bps: u32) -> Money {
        let scaled = self.0 as i128 * bps as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Splits the amount into `parts` equal shares using floor division.
    ///
    /// Returns `(share, remainder)` where `share * parts + remainder == self`.
    /// Returns `None` when `parts` is zero.
    ///
    /// ```rust
    /// use kavling_core::money::Money;
    ///
    /// let (share, rest) = Money::from_rupiah(10_000_000).split_even(3).unwrap();
    /// assert_eq!(share.rupiah(), 3_333_333);
    /// assert_eq!(rest.rupiah(), 1);
    /// ```
    pub fn split_even(&self, parts: u32) -> Option<(Money, Money)> {
        if parts == 0 {
            return None;
        }
        let parts = parts as i64;
        let share = self.0.div_euclid(parts);
        Some((Money(share), Money(self.0 - share * parts)))
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an amount in rupiah")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Ok(Money(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .map(Money)
                    .map_err(|_| E::custom("amount out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                if !v.is_finite() || v.abs() > i64::MAX as f64 {
                    return Err(E::custom("amount out of range"));
                }
                Ok(Money(v.round() as i64))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
                Ok(Money::zero())
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rp{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a count (months, lines).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, n: i64) -> Self {
        Money(self.0 * n)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer_and_float() {
        let a: Money = serde_json::from_str("1000000").unwrap();
        assert_eq!(a.rupiah(), 1_000_000);

        let b: Money = serde_json::from_str("833333.3333").unwrap();
        assert_eq!(b.rupiah(), 833_333);

        let c: Money = serde_json::from_str("0.5").unwrap();
        assert_eq!(c.rupiah(), 1);
    }

    #[test]
    fn test_decode_null_is_zero() {
        let m: Money = serde_json::from_str("null").unwrap();
        assert!(m.is_zero());
    }

    #[test]
    fn test_decode_rejects_strings() {
        assert!(serde_json::from_str::<Money>("\"100\"").is_err());
    }

    #[test]
    fn test_serialize_is_integer() {
        let json = serde_json::to_string(&Money::from_rupiah(150_000)).unwrap();
        assert_eq!(json, "150000");
    }

    #[test]
    fn test_percent_bps_rounds_half_up() {
        assert_eq!(Money::from_rupiah(1_000_000).percent_bps(1000).rupiah(), 100_000);
        assert_eq!(Money::from_rupiah(15).percent_bps(1000).rupiah(), 2);
        assert_eq!(Money::from_rupiah(14).percent_bps(1000).rupiah(), 1);
    }

    #[test]
    fn test_split_even() {
        let (share, rest) = Money::from_rupiah(12_000_000).split_even(12).unwrap();
        assert_eq!(share.rupiah(), 1_000_000);
        assert!(rest.is_zero());

        assert!(Money::from_rupiah(100).split_even(0).is_none());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|r| Money::from_rupiah(*r)).sum();
        assert_eq!(total.rupiah(), 600);
    }
}
