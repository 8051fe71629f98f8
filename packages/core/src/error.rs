//! Error types for misuse / precondition violations.
//!
//! Per the crate's error handling design, domain failures (a proposal is
//! inadmissible) are never represented as `Err`, they are a `Verdict`.
//! These two enums cover the other channel: programmer errors raised by
//! malformed geometry or by touching a blueprint's field layer before it
//! is registered.

use thiserror::Error;

/// Errors raised while constructing or splitting Bezier geometry.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("state vectors must share a dimension: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("de Casteljau split parameter must lie in (0, 1), got {0}")]
    InvalidSplitParameter(f64),
}

/// Errors raised by misuse of a blueprint's field layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlueprintError {
    #[error("field `{0}` is already registered")]
    DuplicateField(String),

    #[error("no field named `{0}`")]
    UnknownField(String),

    #[error("no field at index {0}")]
    UnknownFieldIndex(usize),

    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),

    #[error("forge `{0}` is already registered")]
    DuplicateForge(String),
}
