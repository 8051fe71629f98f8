//! Blueprint runtime: orchestrates a proposal end to end, collecting
//! fields, opening a transaction, running the forge body, building
//! P₀/P₃, verifying, committing or rolling back, and recording the
//! event in the ledger.

use crate::engine::{self, SyntheticReason, VerificationBudget, Verdict, Witness};
use crate::error::BlueprintError;
use crate::field::{Field, FieldValue, StatePath};
use crate::geometry::ControlPoints;
use crate::law::Law;
use crate::ledger::{AppendRequest, Ledger};
use crate::rule::{FieldSnapshot, Rule};
use crate::vector::StateVector;
use std::collections::HashMap;
use std::sync::Arc;

/// One action a forge body can emit. Field writes during the body go
/// to proposals; actions are collected and scanned afterward.
pub enum ForgeAction {
    Commit,
    Reject(String),
    /// `(predicate_name, reason)`, a conditionally-triggered rejection,
    /// distinguished from a plain `Reject` only for diagnostics.
    ConditionalReject(String, String),
}

/// A mutable, name-addressed view over a blueprint's fields, handed to
/// a forge body while it runs.
pub struct FieldTable<'a> {
    fields: &'a mut [Field],
    index_by_name: &'a HashMap<String, usize>,
}

impl<'a> FieldTable<'a> {
    pub fn write(&mut self, name: &str, value: FieldValue) {
        if let Some(&i) = self.index_by_name.get(name) {
            self.fields[i].write(value);
        }
    }

    pub fn move_to(&mut self, name: &str, label: impl Into<String>) {
        if let Some(&i) = self.index_by_name.get(name) {
            self.fields[i].move_to(label);
        }
    }

    pub fn read(&self, name: &str) -> Option<&FieldValue> {
        self.index_by_name.get(name).map(|&i| self.fields[i].read())
    }
}

type ForgeBody = Box<dyn Fn(&mut FieldTable) -> Vec<ForgeAction> + Send + Sync>;

struct ForgeDefinition {
    body: ForgeBody,
}

/// Builder for a [`Blueprint`]'s owned field list, rule set, forge
/// definitions, and continuous laws. Registration, which fixes the
/// dimension ordering, happens once, at [`BlueprintBuilder::build`].
pub struct BlueprintBuilder {
    type_name: String,
    fields: Vec<Field>,
    index_by_name: HashMap<String, usize>,
    rules: Vec<Rule>,
    forges: HashMap<String, ForgeDefinition>,
    laws: Vec<Law>,
    budget: VerificationBudget,
}

impl BlueprintBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            index_by_name: HashMap::new(),
            rules: Vec::new(),
            forges: HashMap::new(),
            laws: Vec::new(),
            budget: VerificationBudget::default(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, initial: FieldValue) -> Result<Self, BlueprintError> {
        let name = name.into();
        if self.index_by_name.contains_key(&name) {
            return Err(BlueprintError::DuplicateField(name));
        }
        let index = self.fields.len();
        self.index_by_name.insert(name.clone(), index);
        self.fields.push(Field::new(name, index, initial));
        Ok(self)
    }

    pub fn field_with_path(
        mut self,
        name: impl Into<String>,
        initial: FieldValue,
        path: StatePath,
    ) -> Result<Self, BlueprintError> {
        let name = name.into();
        if self.index_by_name.contains_key(&name) {
            return Err(BlueprintError::DuplicateField(name));
        }
        let index = self.fields.len();
        self.index_by_name.insert(name.clone(), index);
        self.fields.push(Field::new(name, index, initial).with_state_path(path));
        Ok(self)
    }

    pub fn law(mut self, law: Law) -> Self {
        self.laws.push(law);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Result<Self, BlueprintError> {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(BlueprintError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        Ok(self)
    }

    pub fn forge(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&mut FieldTable) -> Vec<ForgeAction> + Send + Sync + 'static,
    ) -> Result<Self, BlueprintError> {
        let name = name.into();
        if self.forges.contains_key(&name) {
            return Err(BlueprintError::DuplicateForge(name));
        }
        self.forges.insert(
            name,
            ForgeDefinition {
                body: Box::new(body),
            },
        );
        Ok(self)
    }

    pub fn budget(mut self, budget: VerificationBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn build(self, ledger: Arc<Ledger>) -> Blueprint {
        Blueprint {
            type_name: self.type_name,
            fields: self.fields,
            index_by_name: self.index_by_name,
            rules: self.rules,
            forges: self.forges,
            laws: self.laws,
            budget: self.budget,
            ledger,
        }
    }
}

/// A typed object definition (fields + rules + forges), instantiated
/// once and long-lived. Registration is fixed at construction
/// (`BlueprintBuilder::build`): the dimension ordering never changes
/// afterward.
pub struct Blueprint {
    type_name: String,
    fields: Vec<Field>,
    index_by_name: HashMap<String, usize>,
    rules: Vec<Rule>,
    forges: HashMap<String, ForgeDefinition>,
    laws: Vec<Law>,
    budget: VerificationBudget,
    ledger: Arc<Ledger>,
}

impl Blueprint {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_value(&self, name: &str) -> Option<&FieldValue> {
        self.index_by_name.get(name).map(|&i| self.fields[i].committed_value())
    }

    /// Overwrite a field's committed value directly, outside of any
    /// forge transaction. Per [`Field::write`]'s contract this bypasses
    /// the proposal stage entirely. It is for setting up a blueprint's
    /// starting state (tests, fixtures), not for use inside a forge body.
    pub fn set_field(&mut self, name: &str, value: FieldValue) {
        if let Some(&i) = self.index_by_name.get(name) {
            self.fields[i].write(value);
        }
    }

    fn law_names(&self) -> Vec<String> {
        self.laws.iter().map(|l| l.name().to_string()).collect()
    }

    /// Execute a named forge: the full §4.6 lifecycle.
    pub fn forge(&mut self, name: &str) -> Verdict {
        let span = tracing::debug_span!("blueprint::forge", blueprint = %self.type_name, forge = name);
        let _enter = span.enter();

        if !self.forges.contains_key(name) {
            tracing::warn!(forge = name, "no forge with this name");
            let dim = self.fields.len();
            let witness = Witness::synthetic(
                SyntheticReason::UnknownForge,
                0.0,
                StateVector::zero(dim),
                format!("no forge named `{name}`"),
            );
            let verdict = Verdict::Reject(witness);
            self.record_degenerate(name, &verdict);
            return verdict;
        }

        for field in &mut self.fields {
            field.begin_forge();
        }

        let actions = {
            let mut table = FieldTable {
                fields: &mut self.fields,
                index_by_name: &self.index_by_name,
            };
            (self.forges[name].body)(&mut table)
        };

        if let Some(reason) = actions.iter().find_map(|action| match action {
            ForgeAction::Reject(reason) => Some(reason.clone()),
            ForgeAction::ConditionalReject(predicate, reason) => {
                Some(format!("{predicate}: {reason}"))
            }
            ForgeAction::Commit => None,
        }) {
            tracing::info!(forge = name, reason = %reason, "explicit rejection");
            for field in &mut self.fields {
                field.rollback();
            }
            let dim = self.fields.len();
            let witness = Witness::synthetic(SyntheticReason::ExplicitReject, 0.0, StateVector::zero(dim), reason);
            let verdict = Verdict::Reject(witness);
            self.record_degenerate(name, &verdict);
            return verdict;
        }

        let p0 = StateVector::new(
            self.fields.iter().map(Field::current_state_value).collect::<Vec<_>>(),
        );
        let p3 = StateVector::new(
            self.fields.iter().map(Field::proposed_state_value).collect::<Vec<_>>(),
        );
        let cp = ControlPoints::linear(&p0, &p3).expect("a blueprint's fields share one dimension by construction");

        for rule in &self.rules {
            let snapshot = FieldSnapshot::proposed(&self.fields);
            if !rule.evaluate(&snapshot) {
                let failing = rule.failing_conditions(&snapshot).join(", ");
                tracing::info!(forge = name, rule = rule.name(), "rule rejected proposed state");
                for field in &mut self.fields {
                    field.rollback();
                }
                let witness = Witness {
                    law_index: -1,
                    law_name: rule.name().to_string(),
                    time: 1.0,
                    state: p3.clone(),
                    repair_direction: None,
                    reason: format!("rule `{}` fails against the proposed state ({failing})", rule.name()),
                };
                let verdict = Verdict::Reject(witness);
                self.ledger.append(AppendRequest {
                    control_points: &cp,
                    law_names: &self.law_names(),
                    verdict: &verdict,
                    forge_name: Some(name.to_string()),
                    blueprint_type: Some(self.type_name.clone()),
                });
                return verdict;
            }
        }

        let verdict = engine::verify_with_budget(&cp, &self.laws, self.budget);

        match &verdict {
            Verdict::Commit => {
                for field in &mut self.fields {
                    field.commit();
                }
            }
            Verdict::Reject(_) => {
                for field in &mut self.fields {
                    field.rollback();
                }
            }
        }

        self.ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &self.law_names(),
            verdict: &verdict,
            forge_name: Some(name.to_string()),
            blueprint_type: Some(self.type_name.clone()),
        });

        verdict
    }

    /// Free-form geometry: the caller supplies `P0..P3` directly,
    /// bypassing the field-writing steps of `forge`. On commit, the
    /// named fields are updated from `P3`'s corresponding components,
    /// in the order given.
    pub fn move_along(&mut self, cp: ControlPoints, geometry_fields: &[&str]) -> Verdict {
        let span = tracing::debug_span!("blueprint::move_along", blueprint = %self.type_name);
        let _enter = span.enter();

        assert_eq!(
            geometry_fields.len(),
            cp.dimension(),
            "move_along's field list must match the curve's dimension"
        );

        let verdict = engine::verify_with_budget(&cp, &self.laws, self.budget);

        if verdict.is_commit() {
            for (dim, name) in geometry_fields.iter().enumerate() {
                if let Some(&i) = self.index_by_name.get(*name) {
                    let value = cp.p3.get(dim).expect("dimension already checked");
                    self.fields[i].write(FieldValue::Double(value));
                    self.fields[i].commit();
                }
            }
        }

        self.ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &self.law_names(),
            verdict: &verdict,
            forge_name: Some("move_along".to_string()),
            blueprint_type: Some(self.type_name.clone()),
        });

        verdict
    }

    /// Is the current committed state lawful with respect to every
    /// registered law and rule? Laws are evaluated at the committed
    /// state vector; rules against the committed field snapshot.
    pub fn is_lawful(&self) -> bool {
        self.violations().is_empty()
    }

    /// Names of laws and rules the current committed state violates.
    pub fn violations(&self) -> Vec<String> {
        let state = StateVector::new(
            self.fields.iter().map(Field::current_state_value).collect::<Vec<_>>(),
        );
        let mut failing: Vec<String> = self
            .laws
            .iter()
            .filter(|l| !l.holds(&state))
            .map(|l| l.name().to_string())
            .collect();

        let snapshot = FieldSnapshot::committed(&self.fields);
        failing.extend(
            self.rules
                .iter()
                .filter(|r| !r.evaluate(&snapshot))
                .map(|r| r.name().to_string()),
        );
        failing
    }

    fn record_degenerate(&self, forge_name: &str, verdict: &Verdict) {
        let p0 = StateVector::new(
            self.fields.iter().map(Field::current_state_value).collect::<Vec<_>>(),
        );
        let degenerate = ControlPoints::linear(&p0, &p0).expect("a vector always matches itself");
        self.ledger.append(AppendRequest {
            control_points: &degenerate,
            law_names: &self.law_names(),
            verdict,
            forge_name: Some(forge_name.to_string()),
            blueprint_type: Some(self.type_name.clone()),
        });
    }
}
