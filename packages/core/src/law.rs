//! A law is a named predicate over state vectors plus an optional
//! continuous violation measure, defining one region Ωᵢ of the lawful
//! region Ω = ⋂ᵢΩᵢ.

use crate::vector::StateVector;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&StateVector) -> bool + Send + Sync>;
type Measure = Arc<dyn Fn(&StateVector) -> f64 + Send + Sync>;

/// A single declarative law: `name`, a boolean predicate, and an
/// optional continuous measure (by convention, `measure(x) >= 0` iff
/// `predicate(x)` holds).
#[derive(Clone)]
pub struct Law {
    name: String,
    predicate: Predicate,
    measure: Option<Measure>,
}

impl Law {
    pub fn new(name: impl Into<String>, predicate: impl Fn(&StateVector) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            measure: None,
        }
    }

    /// Attach a continuous violation measure. By convention the measure
    /// should be `>= 0` exactly when the predicate holds; the engine's
    /// repair estimation reads `max(0, -measure(x))` as "how far outside
    /// Ω this point is".
    pub fn with_measure(mut self, measure: impl Fn(&StateVector) -> f64 + Send + Sync + 'static) -> Self {
        self.measure = Some(Arc::new(measure));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holds(&self, state: &StateVector) -> bool {
        (self.predicate)(state)
    }

    pub fn measure(&self, state: &StateVector) -> Option<f64> {
        self.measure.as_ref().map(|m| m(state))
    }

    pub fn has_measure(&self) -> bool {
        self.measure.is_some()
    }
}

impl fmt::Debug for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Law")
            .field("name", &self.name)
            .field("has_measure", &self.measure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_and_measure_agree_by_construction() {
        let law = Law::new("x positive", |s: &StateVector| s[0] > 0.0)
            .with_measure(|s: &StateVector| s[0]);

        let inside = StateVector::new(vec![1.0]);
        let outside = StateVector::new(vec![-1.0]);

        assert!(law.holds(&inside));
        assert!(law.measure(&inside).unwrap() >= 0.0);

        assert!(!law.holds(&outside));
        assert!(law.measure(&outside).unwrap() < 0.0);
    }

    #[test]
    fn measure_is_optional() {
        let law = Law::new("always true", |_: &StateVector| true);
        assert!(!law.has_measure());
        assert_eq!(law.measure(&StateVector::zero(1)), None);
    }
}
