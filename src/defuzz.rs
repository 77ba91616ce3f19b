//! Defuzzification: turning an aggregated fuzzy conclusion into a crisp
//! value.
//!
//! The aggregated conclusion for an output variable is reconstructed as a
//! sampled membership curve over the variable's universe: at each sample
//! point the configured s-norm combines every concluded term's membership
//! function clipped at its firing strength (Mamdani clipping). The configured
//! [`DefuzzMethod`] then reduces that curve to a single number.
//!
//! # Methods
//!
//! - **Centroid**: center of area, the default
//! - **Bisector**: vertical line splitting the area in two equal halves
//! - **Mean/Smallest/Largest of Maximum**: points of the maximum plateau
//! - **Weighted average**: of the sampled curve; exact for singleton outputs

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::{FuzzyError, FuzzyResult};
use crate::membership::MembershipFunction;
use crate::norms::SNorm;
use crate::variable::Variable;

/// Tolerance when locating the maximum plateau of a sampled curve.
const PLATEAU_EPS: f64 = 1e-9;

/// Defuzzification strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefuzzMethod {
    /// Center of area of the aggregated curve.
    #[default]
    Centroid,
    /// Point dividing the area under the curve into two equal parts.
    Bisector,
    /// Average of the sample points where membership is maximal.
    MeanOfMaximum,
    /// Leftmost sample point where membership is maximal.
    SmallestOfMaximum,
    /// Rightmost sample point where membership is maximal.
    LargestOfMaximum,
    /// Membership-weighted average of all sample points.
    WeightedAverage,
}

impl fmt::Display for DefuzzMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefuzzMethod::Centroid => write!(f, "centroid"),
            DefuzzMethod::Bisector => write!(f, "bisector"),
            DefuzzMethod::MeanOfMaximum => write!(f, "mom"),
            DefuzzMethod::SmallestOfMaximum => write!(f, "som"),
            DefuzzMethod::LargestOfMaximum => write!(f, "lom"),
            DefuzzMethod::WeightedAverage => write!(f, "weighted-average"),
        }
    }
}

/// What to do when an output variable has no usable fuzzy conclusion: either
/// no rule concluded on it with strength above zero, or the aggregated curve
/// integrates to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Surface [`FuzzyError::NoRuleFired`]. The default: silence here usually
    /// means the antecedent supports do not cover the input space.
    #[default]
    Fail,
    /// Recover with the midpoint of the output variable's universe.
    UniverseMidpoint,
    /// Recover with a fixed crisp value.
    Value(f64),
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Fail => write!(f, "fail"),
            FallbackPolicy::UniverseMidpoint => write!(f, "universe-midpoint"),
            FallbackPolicy::Value(v) => write!(f, "value({v})"),
        }
    }
}

/// Aggregated firing strengths for one output variable, keyed by term.
///
/// Ephemeral: produced per evaluation from the rule firings and discarded.
/// Only strengths above zero are recorded, so an empty conclusion always
/// means "no rule fired", never "fired at zero".
#[derive(Clone, Debug, Default)]
pub struct Conclusion<'a> {
    terms: IndexMap<&'a str, f64>,
}

impl<'a> Conclusion<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine `strength` into the term's aggregate through the s-norm.
    pub fn accumulate(&mut self, term: &'a str, strength: f64, snorm: SNorm) {
        let entry = self.terms.entry(term).or_insert(SNorm::IDENTITY);
        *entry = snorm.apply(*entry, strength);
    }

    pub fn strength(&self, term: &str) -> Option<f64> {
        self.terms.get(term).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.terms.iter().map(|(&term, &strength)| (term, strength))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// An aggregated output fuzzy set, discretized over the variable's universe
/// at uniform spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedSet {
    min: f64,
    max: f64,
    memberships: Vec<f64>,
}

impl AggregatedSet {
    /// Build a sampled set from explicit membership samples.
    pub fn from_samples(min: f64, max: f64, memberships: Vec<f64>) -> Self {
        Self {
            min,
            max,
            memberships,
        }
    }

    /// Reconstruct the aggregated curve of `conclusion` over `variable`'s
    /// universe.
    ///
    /// Non-singleton terms are sampled and clipped at their firing strength.
    /// A singleton term is deposited at the nearest sample point so that the
    /// grid can never miss its spike; a singleton outside the universe
    /// contributes nothing.
    pub fn sample(
        variable: &Variable,
        conclusion: &Conclusion<'_>,
        resolution: usize,
        snorm: SNorm,
    ) -> FuzzyResult<Self> {
        let (min, max) = variable.universe();
        let n = resolution.max(2);
        let step = (max - min) / (n - 1) as f64;
        let mut memberships = vec![0.0; n];

        for (term, strength) in conclusion.iter() {
            let mf = variable
                .terms()
                .get(term)
                .ok_or_else(|| FuzzyError::UnknownTerm {
                    variable: variable.name().to_string(),
                    term: term.to_string(),
                })?;
            match *mf {
                MembershipFunction::Singleton { value } => {
                    if value >= min && value <= max {
                        let idx = (((value - min) / step).round() as usize).min(n - 1);
                        memberships[idx] = snorm.apply(memberships[idx], strength);
                    }
                }
                _ => {
                    for (i, mu) in memberships.iter_mut().enumerate() {
                        let x = min + i as f64 * step;
                        *mu = snorm.apply(*mu, strength.min(mf.degree(x)));
                    }
                }
            }
        }

        Ok(Self {
            min,
            max,
            memberships,
        })
    }

    fn step(&self) -> f64 {
        (self.max - self.min) / (self.memberships.len() - 1).max(1) as f64
    }

    /// Universe value of the i-th sample.
    pub fn value_at(&self, index: usize) -> f64 {
        self.min + index as f64 * self.step()
    }

    pub fn samples(&self) -> &[f64] {
        &self.memberships
    }

    fn max_degree(&self) -> f64 {
        self.memberships.iter().fold(0.0f64, |acc, &mu| acc.max(mu))
    }

    fn plateau_indices(&self) -> Vec<usize> {
        let peak = self.max_degree();
        if peak == 0.0 {
            return Vec::new();
        }
        self.memberships
            .iter()
            .enumerate()
            .filter(|(_, &mu)| (mu - peak).abs() < PLATEAU_EPS)
            .map(|(i, _)| i)
            .collect()
    }

    /// Trapezoidal area under the curve and its first moment, in one pass.
    fn area_and_moment(&self) -> (f64, f64) {
        let step = self.step();
        let mut area = 0.0;
        let mut moment = 0.0;
        for i in 0..self.memberships.len().saturating_sub(1) {
            let segment = step * (self.memberships[i] + self.memberships[i + 1]) / 2.0;
            let x_mid = (self.value_at(i) + self.value_at(i + 1)) / 2.0;
            area += segment;
            moment += x_mid * segment;
        }
        (area, moment)
    }

    /// Center of area, or `None` for an all-zero curve.
    pub fn centroid(&self) -> Option<f64> {
        let (area, moment) = self.area_and_moment();
        if area == 0.0 {
            return None;
        }
        Some(moment / area)
    }

    /// Point splitting the area in two equal halves, or `None` for an
    /// all-zero curve.
    pub fn bisector(&self) -> Option<f64> {
        let (total, _) = self.area_and_moment();
        if total == 0.0 {
            return None;
        }
        let step = self.step();
        let target = total / 2.0;
        let mut cumulative = 0.0;
        for i in 0..self.memberships.len() - 1 {
            let segment = step * (self.memberships[i] + self.memberships[i + 1]) / 2.0;
            if cumulative + segment >= target {
                // Interpolate inside this segment
                let fraction = if segment > 0.0 {
                    (target - cumulative) / segment
                } else {
                    0.5
                };
                return Some(self.value_at(i) + fraction * step);
            }
            cumulative += segment;
        }
        Some((self.min + self.max) / 2.0)
    }

    /// Average of the maximum plateau, or `None` for an all-zero curve.
    pub fn mean_of_maximum(&self) -> Option<f64> {
        let plateau = self.plateau_indices();
        if plateau.is_empty() {
            return None;
        }
        let sum: f64 = plateau.iter().map(|&i| self.value_at(i)).sum();
        Some(sum / plateau.len() as f64)
    }

    /// Leftmost point of the maximum plateau.
    pub fn smallest_of_maximum(&self) -> Option<f64> {
        self.plateau_indices().first().map(|&i| self.value_at(i))
    }

    /// Rightmost point of the maximum plateau.
    pub fn largest_of_maximum(&self) -> Option<f64> {
        self.plateau_indices().last().map(|&i| self.value_at(i))
    }

    /// Membership-weighted average of the sample points, or `None` if all
    /// memberships are zero. Exact for singleton conclusions.
    pub fn weighted_average(&self) -> Option<f64> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &mu) in self.memberships.iter().enumerate() {
            numerator += self.value_at(i) * mu;
            denominator += mu;
        }
        if denominator == 0.0 {
            None
        } else {
            Some(numerator / denominator)
        }
    }
}

/// Defuzzify an aggregated conclusion for `variable` into a crisp value.
///
/// An empty conclusion, or a conclusion whose sampled curve carries no mass,
/// runs the configured [`FallbackPolicy`].
pub fn defuzzify(
    conclusion: &Conclusion<'_>,
    variable: &Variable,
    config: &EngineConfig,
) -> FuzzyResult<f64> {
    if conclusion.is_empty() {
        return fallback(variable, config);
    }
    let set = AggregatedSet::sample(variable, conclusion, config.resolution, config.snorm)?;
    let crisp = match config.defuzz {
        DefuzzMethod::Centroid => set.centroid(),
        DefuzzMethod::Bisector => set.bisector(),
        DefuzzMethod::MeanOfMaximum => set.mean_of_maximum(),
        DefuzzMethod::SmallestOfMaximum => set.smallest_of_maximum(),
        DefuzzMethod::LargestOfMaximum => set.largest_of_maximum(),
        DefuzzMethod::WeightedAverage => set.weighted_average(),
    };
    match crisp {
        Some(value) => Ok(value),
        None => fallback(variable, config),
    }
}

fn fallback(variable: &Variable, config: &EngineConfig) -> FuzzyResult<f64> {
    match config.fallback {
        FallbackPolicy::Fail => Err(FuzzyError::NoRuleFired {
            variable: variable.name().to_string(),
        }),
        FallbackPolicy::UniverseMidpoint => {
            let (min, max) = variable.universe();
            Ok((min + max) / 2.0)
        }
        FallbackPolicy::Value(value) => Ok(value),
    }
}
