//! Membership function shapes.
//!
//! A membership function maps a crisp value to a degree of membership in
//! \[0,1\] for one linguistic term. The shapes form a closed family of
//! tagged variants: rules only ever see the `degree` capability, and keeping
//! the family closed makes variables serializable and `Send + Sync` without
//! trait objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// A membership function shape. Immutable once constructed; every shape is a
/// pure total function from the real line into \[0,1\].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MembershipFunction {
    /// Triangle with feet at `a` and `c` and peak at `b` (`a <= b <= c`).
    /// A degenerate foot (`a == b` or `b == c`) gives a vertical edge.
    Triangular { a: f64, b: f64, c: f64 },
    /// Trapezoid with feet at `a`/`d` and plateau over `[b, c]`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    /// Gaussian bell centered on `mean` with width `sigma`.
    Gaussian { mean: f64, sigma: f64 },
    /// Crisp spike: degree 1 exactly at `value`, 0 elsewhere.
    Singleton { value: f64 },
}

impl MembershipFunction {
    pub fn triangular(a: f64, b: f64, c: f64) -> FuzzyResult<Self> {
        ensure_finite(&[a, b, c])?;
        if !(a <= b && b <= c) {
            return Err(FuzzyError::InvalidMembership {
                reason: format!("triangular break points must be ordered, got ({a}, {b}, {c})"),
            });
        }
        if a == c {
            return Err(FuzzyError::InvalidMembership {
                reason: format!("triangular({a}, {b}, {c}) has zero width; use a singleton"),
            });
        }
        Ok(Self::Triangular { a, b, c })
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> FuzzyResult<Self> {
        ensure_finite(&[a, b, c, d])?;
        if !(a <= b && b <= c && c <= d) {
            return Err(FuzzyError::InvalidMembership {
                reason: format!(
                    "trapezoidal break points must be ordered, got ({a}, {b}, {c}, {d})"
                ),
            });
        }
        if a == d {
            return Err(FuzzyError::InvalidMembership {
                reason: format!("trapezoidal({a}, {b}, {c}, {d}) has zero width; use a singleton"),
            });
        }
        Ok(Self::Trapezoidal { a, b, c, d })
    }

    pub fn gaussian(mean: f64, sigma: f64) -> FuzzyResult<Self> {
        ensure_finite(&[mean, sigma])?;
        if sigma <= 0.0 {
            return Err(FuzzyError::InvalidMembership {
                reason: format!("gaussian sigma must be positive, got {sigma}"),
            });
        }
        Ok(Self::Gaussian { mean, sigma })
    }

    pub fn singleton(value: f64) -> FuzzyResult<Self> {
        ensure_finite(&[value])?;
        Ok(Self::Singleton { value })
    }

    /// Degree of membership of `x`, always in \[0,1\].
    pub fn degree(&self, x: f64) -> f64 {
        let raw = match *self {
            Self::Triangular { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    // x in [a, b) is non-empty, so b > a
                    (x - a) / (b - a)
                } else {
                    // x in (b, c], so c > b
                    (c - x) / (c - b)
                }
            }
            Self::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
            Self::Gaussian { mean, sigma } => {
                let z = (x - mean) / sigma;
                (-0.5 * z * z).exp()
            }
            Self::Singleton { value } => {
                if x == value {
                    1.0
                } else {
                    0.0
                }
            }
        };
        raw.clamp(0.0, 1.0)
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, Self::Singleton { .. })
    }
}

impl fmt::Display for MembershipFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Triangular { a, b, c } => write!(f, "triangular({a}, {b}, {c})"),
            Self::Trapezoidal { a, b, c, d } => write!(f, "trapezoidal({a}, {b}, {c}, {d})"),
            Self::Gaussian { mean, sigma } => write!(f, "gaussian({mean}, {sigma})"),
            Self::Singleton { value } => write!(f, "singleton({value})"),
        }
    }
}

fn ensure_finite(values: &[f64]) -> FuzzyResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FuzzyError::InvalidMembership {
            reason: format!("parameters must be finite, got {values:?}"),
        });
    }
    Ok(())
}
