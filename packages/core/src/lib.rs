//! Newton verification engine and transactional field model.
//!
//! Verifies whether a proposed state transition of a multi-dimensional
//! object is admissible with respect to a declarative law set, using a
//! cubic Bezier trajectory between the current and proposed states as
//! the candidate path. Accepted and rejected proposals are appended to
//! a deterministic, reproducible ledger.
//!
//! The surface DSL for declaring rules/forges ergonomically, a
//! string-path enum convenience layer, and example blueprint types are
//! out of scope for this crate; see the crate-level docs in `DESIGN.md`
//! for the boundary.

pub mod blueprint;
pub mod engine;
pub mod error;
pub mod field;
pub mod geometry;
pub mod law;
pub mod ledger;
pub mod numeric;
pub mod rule;
pub mod vector;

pub use blueprint::{Blueprint, BlueprintBuilder, FieldTable, ForgeAction};
pub use engine::{verify, verify_with, verify_with_budget, RepairConfig, SyntheticReason, VerificationBudget, Verdict, Witness};
pub use error::{BlueprintError, GeometryError};
pub use field::{Field, FieldValue, StatePath};
pub use geometry::{bernstein, ControlPoints};
pub use law::Law;
pub use ledger::{AppendRequest, Ledger, LedgerEntry};
pub use numeric::NumericValue;
pub use rule::{FieldSnapshot, Rule, RuleCondition};
pub use vector::StateVector;
