//! Transactional field cells: the blueprint's state, one dimension per
//! cell, with two-phase commit semantics and typed encoding into the
//! double-valued state vector the engine consumes.

use crate::numeric::NumericValue;
use serde::{Deserialize, Serialize};

/// A typed value a field cell can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Decimal(NumericValue),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    /// A labelled string; only meaningful alongside a [`StatePath`]
    /// attached to the same field.
    Label(String),
}

impl FieldValue {
    /// Encode this value to a double for use in a state vector.
    /// Booleans decode at a 0.5 threshold; labels need the field's
    /// attached [`StatePath`] to find their ordinal position and
    /// encode to `NaN` without one.
    pub fn encode(&self, state_path: Option<&StatePath>) -> f64 {
        match self {
            FieldValue::Decimal(d) => d.to_f64(),
            FieldValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FieldValue::Integer(i) => *i as f64,
            FieldValue::Double(d) => *d,
            FieldValue::Label(label) => state_path
                .and_then(|path| path.index_of(label))
                .map(|i| i as f64)
                .unwrap_or(f64::NAN),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            FieldValue::Label(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<NumericValue> {
        match self {
            FieldValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

/// An ordered, labelled state path for a string-enum-like field (e.g.
/// `["draft", "submitted", "approved", "paid"]`). A sparse integer-backed
/// enum with a name table, per the design notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePath {
    labels: Vec<String>,
}

impl StatePath {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One transactional dimension of a blueprint's state.
///
/// `begin_forge` clears any stale proposal and marks the cell as
/// forging; `write` goes to the proposal while forging, or overwrites
/// the committed value directly otherwise; `commit` promotes the
/// proposal; `rollback` discards it. Validity of a proposed label
/// (e.g. "is this a legal status transition") is not enforced here,
/// that is a rule's job.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    index: usize,
    committed: FieldValue,
    proposed: Option<FieldValue>,
    forging: bool,
    state_path: Option<StatePath>,
}

impl Field {
    pub fn new(name: impl Into<String>, index: usize, initial: FieldValue) -> Self {
        Self {
            name: name.into(),
            index,
            committed: initial,
            proposed: None,
            forging: false,
            state_path: None,
        }
    }

    pub fn with_state_path(mut self, path: StatePath) -> Self {
        self.state_path = Some(path);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_forging(&self) -> bool {
        self.forging
    }

    pub fn state_path(&self) -> Option<&StatePath> {
        self.state_path.as_ref()
    }

    pub fn begin_forge(&mut self) {
        self.forging = true;
        self.proposed = None;
    }

    pub fn write(&mut self, value: FieldValue) {
        if self.forging {
            self.proposed = Some(value);
        } else {
            self.committed = value;
        }
    }

    /// Proposal if forging and set, else the committed value.
    pub fn read(&self) -> &FieldValue {
        self.proposed.as_ref().unwrap_or(&self.committed)
    }

    pub fn committed_value(&self) -> &FieldValue {
        &self.committed
    }

    pub fn proposed_value(&self) -> Option<&FieldValue> {
        self.proposed.as_ref()
    }

    pub fn commit(&mut self) {
        if let Some(proposed) = self.proposed.take() {
            self.committed = proposed;
        }
        self.forging = false;
    }

    pub fn rollback(&mut self) {
        self.proposed = None;
        self.forging = false;
    }

    pub fn current_state_value(&self) -> f64 {
        self.committed.encode(self.state_path.as_ref())
    }

    /// Double encoding of the proposal; equals the committed encoding
    /// when there is no active proposal.
    pub fn proposed_state_value(&self) -> f64 {
        self.proposed
            .as_ref()
            .unwrap_or(&self.committed)
            .encode(self.state_path.as_ref())
    }

    pub fn move_to(&mut self, label: impl Into<String>) {
        self.write(FieldValue::Label(label.into()));
    }
}
