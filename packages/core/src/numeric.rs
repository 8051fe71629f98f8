//! Exact decimal scalar, with conversion to double for geometry.
//!
//! Field cells that carry money-like quantities (an invoice amount, say)
//! want exact decimal arithmetic; the verification engine works in
//! doubles. `NumericValue` is the seam between the two: an exact
//! `rust_decimal::Decimal` on the field side, widened to `f64` only when
//! a state vector needs to be built.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exact decimal scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NumericValue(Decimal);

impl NumericValue {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Widen to `f64` for use in a state vector. Values outside `f64`'s
    /// exact range lose precision the same way any decimal-to-double
    /// conversion would; the geometry layer only ever needs doubles.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl From<Decimal> for NumericValue {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for NumericValue {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl FromStr for NumericValue {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
