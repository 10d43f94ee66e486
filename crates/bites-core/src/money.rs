//! # Money Module
//!
//! Fixed-point monetary values and the conversion helpers used at the API
//! boundary.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Recomputing a cart total with floats on every mutation:                │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift compounds                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                      │
//! │    ₹199.99 is stored as 19999                                           │
//! │    Every sum and product is exact; rounding only happens once,          │
//! │    when a float enters the system (`to_fixed_decimal`).                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Conversions
//! ```text
//! JSON number ──► to_fixed_decimal() ──► Money ──► arithmetic / storage
//!                                          │
//!                                          ▼
//!                              from_fixed_decimal() ──► JSON number
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Minor units per major unit (2 fractional digits).
const MINOR_PER_MAJOR: i64 = 100;

/// Largest magnitude accepted from a float (keeps `x * 100` exact in f64).
const MAX_MAJOR_MAGNITUDE: f64 = 9_000_000_000_000.0;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (2 fixed fractional digits).
///
/// ## Where Money is Used
/// ```text
/// Product.price ──┬──► CartItem.unit_price (snapshot) ──► Cart.total_price
///                 │
///                 └──► checkout reprice ──► subtotal ──► discount ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use bites_core::money::Money;
    ///
    /// let price = Money::from_minor(19999); // ₹199.99
    /// assert_eq!(price.minor(), 19999);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ```rust
    /// use bites_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `rate` of this amount, rounded half-up to the nearest minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    ///
    /// ```rust
    /// use bites_core::money::{Money, Percent};
    ///
    /// let subtotal = Money::from_major(200);
    /// let ten_percent = subtotal.percentage(Percent::from_whole(10));
    /// assert_eq!(ten_percent, Money::from_major(20));
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        // i128 keeps large subtotals from overflowing before the division
        let minor = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(minor as i64)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Subtracts `other`, flooring the result at zero.
    #[inline]
    pub fn saturating_sub_floor_zero(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Returns the value as a native float, for display and transport only.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }
}

// =============================================================================
// Boundary Conversions
// =============================================================================

/// Converts a native number to fixed-point money, rounding to 2 places.
///
/// ## Errors
/// `CoreError::InvalidAmount` when the input is NaN, infinite or too large to
/// represent.
///
/// ```rust
/// use bites_core::money::to_fixed_decimal;
///
/// assert_eq!(to_fixed_decimal(10.005).unwrap().minor(), 1001);
/// assert!(to_fixed_decimal(f64::NAN).is_err());
/// ```
pub fn to_fixed_decimal(value: f64) -> CoreResult<Money> {
    if !value.is_finite() {
        return Err(CoreError::InvalidAmount {
            reason: format!("{value} is not a finite number"),
        });
    }

    if value.abs() > MAX_MAJOR_MAGNITUDE {
        return Err(CoreError::InvalidAmount {
            reason: format!("{value} is out of range"),
        });
    }

    // Scale first, then round half away from zero. The small epsilon absorbs
    // binary representation error (10.005 is stored as 10.00499999...).
    let scaled = value * MINOR_PER_MAJOR as f64;
    let nudged = scaled + scaled.signum() * 1e-7;
    Ok(Money(nudged.round() as i64))
}

/// Parses a number-like string into fixed-point money.
///
/// ```rust
/// use bites_core::money::parse_fixed_decimal;
///
/// assert_eq!(parse_fixed_decimal(" 49.5 ").unwrap().minor(), 4950);
/// assert!(parse_fixed_decimal("forty").is_err());
/// ```
pub fn parse_fixed_decimal(input: &str) -> CoreResult<Money> {
    let value: f64 = input.trim().parse().map_err(|_| CoreError::InvalidAmount {
        reason: format!("'{}' is not numeric", input.trim()),
    })?;
    to_fixed_decimal(value)
}

/// Converts optional fixed-point money back to a native number.
///
/// An unset value is reported as `0.0` ("no value set"), not an error.
pub fn from_fixed_decimal(value: Option<Money>) -> f64 {
    value.map(|m| m.to_f64()).unwrap_or(0.0)
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points (1% = 100 bps, 100% = 10000 bps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(i64);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a whole number of percent.
    #[inline]
    pub const fn from_whole(pct: i64) -> Self {
        Percent(pct * 100)
    }

    /// Returns basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a percentage number (display only).
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display with the rupee sign; clients format for locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            abs / MINOR_PER_MAJOR,
            abs % MINOR_PER_MAJOR
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
