//! Pluggable t-norm (fuzzy AND) and s-norm (fuzzy OR) operators.
//!
//! A t-norm is a binary operation T: \[0,1\] × \[0,1\] → \[0,1\] that is
//! commutative, associative, monotonic and has 1 as identity; an s-norm is
//! its dual with 0 as identity. Rule firing folds antecedent degrees through
//! the configured t-norm, aggregation folds rule conclusions through the
//! configured s-norm.

use std::fmt;

use serde::{Deserialize, Serialize};

/// T-norm (fuzzy AND) used to combine a rule's antecedent degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TNorm {
    /// Gödel minimum: T(a,b) = min(a,b). The standard fuzzy AND.
    #[default]
    Minimum,
    /// Product: T(a,b) = a·b.
    Product,
    /// Łukasiewicz: T(a,b) = max(0, a + b - 1).
    Lukasiewicz,
}

impl TNorm {
    /// The fold identity: T(a, identity) = a for every member of the family.
    pub const IDENTITY: f64 = 1.0;

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            TNorm::Minimum => a.min(b),
            TNorm::Product => a * b,
            TNorm::Lukasiewicz => (a + b - 1.0).max(0.0),
        }
    }

    /// Fold an iterator of degrees, starting from the identity.
    pub fn fold(self, degrees: impl IntoIterator<Item = f64>) -> f64 {
        degrees
            .into_iter()
            .fold(Self::IDENTITY, |acc, d| self.apply(acc, d))
    }
}

impl fmt::Display for TNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TNorm::Minimum => write!(f, "min"),
            TNorm::Product => write!(f, "prod"),
            TNorm::Lukasiewicz => write!(f, "lukasiewicz"),
        }
    }
}

/// S-norm (fuzzy OR) used to aggregate rule conclusions per output term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SNorm {
    /// Gödel maximum: S(a,b) = max(a,b). Idempotent, so aggregation is
    /// insensitive to rule insertion order.
    #[default]
    Maximum,
    /// Probabilistic sum: S(a,b) = a + b - a·b.
    ProbabilisticSum,
    /// Łukasiewicz bounded sum: S(a,b) = min(1, a + b).
    BoundedSum,
}

impl SNorm {
    /// The fold identity: S(a, identity) = a for every member of the family.
    pub const IDENTITY: f64 = 0.0;

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            SNorm::Maximum => a.max(b),
            SNorm::ProbabilisticSum => a + b - a * b,
            SNorm::BoundedSum => (a + b).min(1.0),
        }
    }
}

impl fmt::Display for SNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SNorm::Maximum => write!(f, "max"),
            SNorm::ProbabilisticSum => write!(f, "probor"),
            SNorm::BoundedSum => write!(f, "bounded-sum"),
        }
    }
}
