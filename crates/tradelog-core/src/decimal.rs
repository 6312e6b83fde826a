//! Precision-safe P&L amounts.
//!
//! Uses `rust_decimal` so totals over thousands of trades add up exactly and
//! so a bound typed into a filter round-trips through the URL unchanged.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Neg, Sub};
use std::str::FromStr;

/// Realized profit or loss of a trade, in account currency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Pnl(pub Decimal);

impl Pnl {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// A winning trade has strictly positive P&L.
    #[inline]
    pub fn is_win(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// A losing trade has strictly negative P&L.
    #[inline]
    pub fn is_loss(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Canonical text form: trailing zeros stripped, `-0` folded to `0`.
    ///
    /// `1.50` and `1.5` are the same bound, so they must encode identically.
    pub fn canonical(&self) -> String {
        let normalized = self.0.normalize();
        if normalized.is_zero() {
            return "0".to_string();
        }
        normalized.to_string()
    }

    /// Sum that stops at the `Decimal` bounds instead of panicking.
    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Lossy conversion for display ratios.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Pnl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Pnl {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match Decimal::from_str(s) {
            Ok(d) => Ok(Self(d)),
            // Stored payloads may carry JSON numbers such as `1e3`.
            Err(e) => Decimal::from_scientific(s).map(Self).map_err(|_| e),
        }
    }
}

impl From<Decimal> for Pnl {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Pnl {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Pnl {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Pnl {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Div<Decimal> for Pnl {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Sum for Pnl {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl<'a> Sum<&'a Pnl> for Pnl {
    fn sum<I: Iterator<Item = &'a Pnl>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
