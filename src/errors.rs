//! Errors
//!
//! Custom error types used throughout the `mofr` crate.
use thiserror::Error;

/// Errors that can occur while evaluating a model or a predictor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// A referenced column is absent, or cannot be coerced to the required type.
    #[error("Schema error: {0}")]
    Schema(String),
    /// Number of distinct categories falls outside the configured bounds.
    #[error("Column {column} has {found} unique values, expected between {min} and {max}.")]
    Cardinality {
        column: String,
        found: usize,
        min: usize,
        max: usize,
    },
    /// A group, or the whole input, lacks the diversity a metric requires.
    #[error("Degenerate group: {0}")]
    DegenerateGroup(String),
    /// Malformed arguments passed to a metric or an evaluator.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EvaluationError {
    /// Degenerate errors are localized to a single group during aggregation,
    /// all the other kinds abort the evaluation.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, EvaluationError::DegenerateGroup(_))
    }
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
