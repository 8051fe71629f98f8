//! Fixed-dimension vector of doubles, the encoding a blueprint's fields
//! are flattened into before a trajectory is built.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered sequence of doubles. Two state vectors are only ever
/// combined after a caller has confirmed their dimensions agree;
/// callers that skip the check get [`GeometryError::DimensionMismatch`]
/// rather than a panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector(Vec<f64>);

impl StateVector {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self(values.into())
    }

    pub fn zero(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    fn require_same_dimension(&self, other: &StateVector) -> Result<(), GeometryError> {
        if self.dimension() != other.dimension() {
            return Err(GeometryError::DimensionMismatch {
                expected: self.dimension(),
                found: other.dimension(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &StateVector) -> Result<StateVector, GeometryError> {
        self.require_same_dimension(other)?;
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect(),
        ))
    }

    pub fn checked_sub(&self, other: &StateVector) -> Result<StateVector, GeometryError> {
        self.require_same_dimension(other)?;
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect(),
        ))
    }

    pub fn scale(&self, k: f64) -> StateVector {
        Self(self.0.iter().map(|v| v * k).collect())
    }

    /// Linear interpolation `self + t * (other - self)`. Assumes equal
    /// dimension; used internally by geometry code that has already
    /// validated the operands at construction time.
    pub(crate) fn lerp(&self, other: &StateVector, t: f64) -> StateVector {
        Self(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a + t * (b - a))
                .collect(),
        )
    }

    pub(crate) fn combine(&self, other: &StateVector, f: impl Fn(f64, f64) -> f64) -> StateVector {
        Self(self.0.iter().zip(&other.0).map(|(a, b)| f(*a, *b)).collect())
    }

    pub(crate) fn map(&self, f: impl Fn(f64) -> f64) -> StateVector {
        Self(self.0.iter().map(|v| f(*v)).collect())
    }
}

impl Index<usize> for StateVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl FromIterator<f64> for StateVector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
