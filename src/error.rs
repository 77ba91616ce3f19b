//! Error types for the engine.
//!
//! Configuration errors (unknown or duplicate names, dangling rule
//! references) are reported eagerly at the mutating call; evaluation-time
//! errors carry enough context (variable, term, rule indices) to point at the
//! misconfiguration that caused them.

use thiserror::Error;

use crate::variable::VariableRole;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FuzzyError {
    #[error("Unknown {role} variable '{variable}'")]
    UnknownVariable {
        role: VariableRole,
        variable: String,
    },
    #[error("Variable '{variable}' has no term '{term}'")]
    UnknownTerm { variable: String, term: String },
    #[error("{role} variable '{variable}' already registered")]
    DuplicateVariable {
        role: VariableRole,
        variable: String,
    },
    #[error("Variable '{variable}' already has a term '{term}'")]
    DuplicateTerm { variable: String, term: String },
    #[error("Rule references missing {role} term '{variable}.{term}'")]
    InvalidRuleReference {
        role: VariableRole,
        variable: String,
        term: String,
    },
    #[error("Rule has no antecedents")]
    EmptyAntecedent,
    #[error("Rule index {index} out of bounds (table has {len} rules)")]
    UnknownRule { index: usize, len: usize },
    #[error("Rule weight {weight} outside [0, 1]")]
    InvalidWeight { weight: f64 },
    #[error("Invalid membership function: {reason}")]
    InvalidMembership { reason: String },
    #[error("Variable '{variable}' universe [{min}, {max}] is not a finite non-empty range")]
    InvalidUniverse {
        variable: String,
        min: f64,
        max: f64,
    },
    #[error("Defuzzification resolution {samples} too coarse (need at least 2 samples)")]
    InvalidResolution { samples: usize },
    #[error("Sweep range [{lmin}, {lmax}] with step {step} is not a finite ascending range")]
    InvalidRange { lmin: f64, lmax: f64, step: f64 },
    #[error("Term '{variable}.{term}' is referenced by rules {rules:?}; remove them first or use the cascade form")]
    TermInUse {
        variable: String,
        term: String,
        rules: Vec<usize>,
    },
    #[error("Variable '{variable}' is referenced by rules {rules:?}; remove them first")]
    VariableInUse { variable: String, rules: Vec<usize> },
    #[error("Input dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Input for variable '{variable}' is not finite ({value})")]
    NonFiniteInput { variable: String, value: f64 },
    #[error("No rule fired for output variable '{variable}'")]
    NoRuleFired { variable: String },
    #[error("Engine not configured: {reason}")]
    NotConfigured { reason: String },
}

/// Result type for engine operations.
pub type FuzzyResult<T> = Result<T, FuzzyError>;
