//! Typed search errors.
//!
//! Errors here represent pre-flight and configuration failures only. Runtime
//! terminations (goal found, frontier exhausted, budget exhaustion) are
//! expressed through [`crate::engine::EngineStatus`] and never as errors.

use thiserror::Error;

/// Typed failure for pre-flight policy validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A policy field holds a value the engines cannot honor.
    #[error("invalid search policy: {detail}")]
    InvalidPolicy { detail: String },
}

/// Failure writing into an evaluator cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    /// The evaluator is a projection of node data and owns no writable cache.
    #[error("evaluator `{name}` is a read-only projection")]
    ReadOnly { name: String },
}
