//! Named groupings of boolean conditions over current field values,
//! the bridge between the declarative surface and the engine's `Law`
//! form.
//!
//! Conditions are plain functions over an explicit [`FieldSnapshot`]
//! rather than closures holding mutable references into the blueprint:
//! the snapshot is a read-only view by field index/name, built fresh at
//! evaluation time.

use crate::field::{Field, FieldValue};
use crate::law::Law;
use crate::vector::StateVector;
use std::sync::Arc;

/// A read-only view of a blueprint's fields at one instant, used while
/// evaluating rule conditions. `committed()` looks at the committed
/// value of every field; `proposed()` looks at the proposal where one
/// is pending, falling back to committed otherwise (mirroring
/// [`Field::read`]).
pub struct FieldSnapshot<'a> {
    fields: &'a [Field],
    use_proposed: bool,
}

impl<'a> FieldSnapshot<'a> {
    pub fn committed(fields: &'a [Field]) -> Self {
        Self {
            fields,
            use_proposed: false,
        }
    }

    pub fn proposed(fields: &'a [Field]) -> Self {
        Self {
            fields,
            use_proposed: true,
        }
    }

    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index).map(|f| self.read(f))
    }

    pub fn value_by_name(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name() == name).map(|f| self.read(f))
    }

    pub fn encoded(&self, index: usize) -> Option<f64> {
        let field = self.fields.get(index)?;
        let value = self.read(field);
        Some(value.encode(field.state_path()))
    }

    fn read(&self, field: &'a Field) -> &'a FieldValue {
        if self.use_proposed {
            field.read()
        } else {
            field.committed_value()
        }
    }
}

type ConditionCheck = Arc<dyn Fn(&FieldSnapshot) -> bool + Send + Sync>;

/// One labelled boolean condition inside a rule's conjunction.
#[derive(Clone)]
pub struct RuleCondition {
    label: String,
    check: ConditionCheck,
}

impl RuleCondition {
    pub fn new(label: impl Into<String>, check: impl Fn(&FieldSnapshot) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn holds(&self, snapshot: &FieldSnapshot) -> bool {
        (self.check)(snapshot)
    }
}

impl std::fmt::Debug for RuleCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCondition").field("label", &self.label).finish()
    }
}

/// A named conjunction of labelled boolean conditions, evaluated
/// against a field snapshot.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    name: String,
    conditions: Vec<RuleCondition>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn condition(
        mut self,
        label: impl Into<String>,
        check: impl Fn(&FieldSnapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.conditions.push(RuleCondition::new(label, check));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, snapshot: &FieldSnapshot) -> bool {
        self.conditions.iter().all(|c| c.holds(snapshot))
    }

    /// Labels of conditions that fail against `snapshot`, for
    /// diagnostics (e.g. a rejection reason).
    pub fn failing_conditions(&self, snapshot: &FieldSnapshot) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| !c.holds(snapshot))
            .map(|c| c.label())
            .collect()
    }

    /// Lower this rule to the engine's `Law` form by evaluating it once,
    /// now, against `snapshot`, and baking the boolean result into a
    /// predicate that ignores its state-vector argument: evaluate
    /// directly against the proposed end-state rather than re-running
    /// the rule at every point the engine samples. Cheaper, and
    /// sufficient because rule conditions read typed field values that
    /// are only meaningful at the endpoints of a proposal, not at
    /// interior curve points.
    pub fn to_law(&self, snapshot: &FieldSnapshot) -> Law {
        let holds = self.evaluate(snapshot);
        let name = self.name.clone();
        Law::new(name, move |_state: &StateVector| holds)
    }
}
