//! Cubic Bezier control points, curve evaluation, derivative, De
//! Casteljau subdivision, and the Bernstein basis the hull tests lean
//! on.

use crate::error::GeometryError;
use crate::vector::StateVector;
use serde::{Deserialize, Serialize};

/// The four control points of a cubic Bezier curve through state space.
/// All four share a single dimension, enforced at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints {
    pub p0: StateVector,
    pub p1: StateVector,
    pub p2: StateVector,
    pub p3: StateVector,
}

impl ControlPoints {
    pub fn new(
        p0: StateVector,
        p1: StateVector,
        p2: StateVector,
        p3: StateVector,
    ) -> Result<Self, GeometryError> {
        let dim = p0.dimension();
        for (label, v) in [("p1", &p1), ("p2", &p2), ("p3", &p3)] {
            if v.dimension() != dim {
                tracing::warn!(label, expected = dim, found = v.dimension(), "dimension mismatch constructing control points");
                return Err(GeometryError::DimensionMismatch {
                    expected: dim,
                    found: v.dimension(),
                });
            }
        }
        Ok(Self { p0, p1, p2, p3 })
    }

    /// `linear(from a, to b)`: `P0=a`, `P1=a+1/3(b-a)`, `P2=a+2/3(b-a)`, `P3=b`.
    pub fn linear(from: &StateVector, to: &StateVector) -> Result<Self, GeometryError> {
        if from.dimension() != to.dimension() {
            return Err(GeometryError::DimensionMismatch {
                expected: from.dimension(),
                found: to.dimension(),
            });
        }
        let p1 = from.lerp(to, 1.0 / 3.0);
        let p2 = from.lerp(to, 2.0 / 3.0);
        Ok(Self {
            p0: from.clone(),
            p1,
            p2,
            p3: to.clone(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.p0.dimension()
    }

    /// Control point `k` (`k` in `0..=3`), in declaration order.
    pub fn control_point(&self, k: usize) -> &StateVector {
        match k {
            0 => &self.p0,
            1 => &self.p1,
            2 => &self.p2,
            3 => &self.p3,
            _ => panic!("control point index out of range: {k}"),
        }
    }

    /// Returns a new set of control points with `P_k`'s `dim`-th
    /// component nudged by `delta`. Used by the engine's repair
    /// estimation to take a one-sided finite difference.
    pub(crate) fn perturbed(&self, k: usize, dim: usize, delta: f64) -> ControlPoints {
        let mut out = self.clone();
        let point = match k {
            0 => &mut out.p0,
            1 => &mut out.p1,
            2 => &mut out.p2,
            3 => &mut out.p3,
            _ => panic!("control point index out of range: {k}"),
        };
        let mut values: Vec<f64> = point.as_slice().to_vec();
        values[dim] += delta;
        *point = StateVector::new(values);
        out
    }

    /// γ(t) = (1−t)³P₀ + 3(1−t)²t·P₁ + 3(1−t)t²·P₂ + t³·P₃, componentwise.
    pub fn evaluate(&self, t: f64) -> StateVector {
        let b0 = bernstein(0, 3, t);
        let b1 = bernstein(1, 3, t);
        let b2 = bernstein(2, 3, t);
        let b3 = bernstein(3, 3, t);
        self.p0
            .map(|v| v * b0)
            .combine(&self.p1.map(|v| v * b1), |a, b| a + b)
            .combine(&self.p2.map(|v| v * b2), |a, b| a + b)
            .combine(&self.p3.map(|v| v * b3), |a, b| a + b)
    }

    /// γ'(t) = 3[(1−t)²(P₁−P₀) + 2(1−t)t(P₂−P₁) + t²(P₃−P₂)].
    pub fn derivative(&self, t: f64) -> StateVector {
        let one_minus_t = 1.0 - t;
        let d0 = self.p1.combine(&self.p0, |a, b| a - b).scale(one_minus_t * one_minus_t);
        let d1 = self.p2.combine(&self.p1, |a, b| a - b).scale(2.0 * one_minus_t * t);
        let d2 = self.p3.combine(&self.p2, |a, b| a - b).scale(t * t);
        d0.combine(&d1, |a, b| a + b).combine(&d2, |a, b| a + b).scale(3.0)
    }

    /// De Casteljau subdivision at parameter `s` in `(0, 1)`.
    ///
    /// `left.P0 = P0`, `right.P3 = P3`, `left.P3 = right.P0 = evaluate(s)`.
    /// The subcurves reparametrise the original: `left.eval(u) =
    /// eval(s*u)`, `right.eval(u) = eval(s + (1-s)*u)`.
    pub fn de_casteljau_split(&self, s: f64) -> Result<(ControlPoints, ControlPoints), GeometryError> {
        if !(s > 0.0 && s < 1.0) {
            return Err(GeometryError::InvalidSplitParameter(s));
        }

        let a = self.p0.lerp(&self.p1, s);
        let b = self.p1.lerp(&self.p2, s);
        let c = self.p2.lerp(&self.p3, s);
        let d = a.lerp(&b, s);
        let e = b.lerp(&c, s);
        let f = d.lerp(&e, s);

        let left = ControlPoints {
            p0: self.p0.clone(),
            p1: a,
            p2: d,
            p3: f.clone(),
        };
        let right = ControlPoints {
            p0: f,
            p1: e,
            p2: c,
            p3: self.p3.clone(),
        };
        Ok((left, right))
    }

    /// Flattened iterator over every scalar component of P0..P3, in
    /// order: the canonical serialisation the ledger hashes over.
    pub(crate) fn iter_components(&self) -> impl Iterator<Item = f64> + '_ {
        self.p0
            .as_slice()
            .iter()
            .chain(self.p1.as_slice())
            .chain(self.p2.as_slice())
            .chain(self.p3.as_slice())
            .copied()
    }
}

/// `bernstein(i, n, t) = C(n,i) * t^i * (1-t)^(n-i)`.
pub fn bernstein(i: usize, n: usize, t: f64) -> f64 {
    binomial(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0_f64;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}
