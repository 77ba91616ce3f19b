//! Linguistic variables and the variable registry.
//!
//! A [`Variable`] owns its linguistic terms (term name → membership function)
//! and a crisp universe of discourse. The [`VariableRegistry`] keeps input
//! and output variables in registration order; that order defines the
//! caller-visible index order of `simulate` input and output vectors.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FuzzyError, FuzzyResult};
use crate::membership::MembershipFunction;

/// Whether a variable sits on the input (antecedent) or output (consequent)
/// side of the rule base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableRole {
    Input,
    Output,
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableRole::Input => write!(f, "input"),
            VariableRole::Output => write!(f, "output"),
        }
    }
}

/// A named variable with a crisp universe and an ordered set of terms.
///
/// Terms are owned by the variable; there is no sharing across variables, so
/// removing a term can never dangle. Term names are unique per variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    role: VariableRole,
    universe: (f64, f64),
    terms: IndexMap<String, MembershipFunction>,
}

impl Variable {
    pub(crate) fn new(
        name: impl Into<String>,
        role: VariableRole,
        universe: (f64, f64),
    ) -> FuzzyResult<Self> {
        let name = name.into();
        let (min, max) = universe;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(FuzzyError::InvalidUniverse {
                variable: name,
                min,
                max,
            });
        }
        Ok(Self {
            name,
            role,
            universe,
            terms: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> VariableRole {
        self.role
    }

    /// The crisp domain as `(min, max)`. Defuzzification samples over it.
    pub fn universe(&self) -> (f64, f64) {
        self.universe
    }

    /// Read-only view of the term map, in insertion order.
    pub fn terms(&self) -> &IndexMap<String, MembershipFunction> {
        &self.terms
    }

    /// Evaluate the named term's membership function at `value`.
    pub fn degree_of(&self, term: &str, value: f64) -> FuzzyResult<f64> {
        let mf = self.terms.get(term).ok_or_else(|| FuzzyError::UnknownTerm {
            variable: self.name.clone(),
            term: term.to_string(),
        })?;
        Ok(mf.degree(value))
    }

    fn add_term(&mut self, term: String, mf: MembershipFunction) -> FuzzyResult<()> {
        if self.terms.contains_key(&term) {
            return Err(FuzzyError::DuplicateTerm {
                variable: self.name.clone(),
                term,
            });
        }
        self.terms.insert(term, mf);
        Ok(())
    }

    fn remove_term(&mut self, term: &str) -> FuzzyResult<MembershipFunction> {
        self.terms
            .shift_remove(term)
            .ok_or_else(|| FuzzyError::UnknownTerm {
                variable: self.name.clone(),
                term: term.to_string(),
            })
    }
}

/// Per-call fuzzification result: membership degrees of one crisp input
/// vector against every registered input term.
///
/// Borrowed from the registry, recomputed on every evaluation and discarded;
/// the engine holds no evaluation-time state between calls.
#[derive(Debug, Clone)]
pub struct Fuzzified<'a> {
    variables: Vec<(&'a str, Vec<(&'a str, f64)>)>,
}

impl<'a> Fuzzified<'a> {
    /// Degree of `(variable, term)`, or `None` if the pair was not fuzzified.
    pub fn degree(&self, variable: &str, term: &str) -> Option<f64> {
        let (_, terms) = self.variables.iter().find(|(v, _)| *v == variable)?;
        terms.iter().find(|(t, _)| *t == term).map(|&(_, d)| d)
    }

    /// Number of fuzzified input variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Registry of input and output variables, each owning its terms.
///
/// Input and output namespaces are independent; registration order is
/// preserved and defines vector index order at the engine interface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableRegistry {
    inputs: IndexMap<String, Variable>,
    outputs: IndexMap<String, Variable>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, role: VariableRole) -> &IndexMap<String, Variable> {
        match role {
            VariableRole::Input => &self.inputs,
            VariableRole::Output => &self.outputs,
        }
    }

    fn map_mut(&mut self, role: VariableRole) -> &mut IndexMap<String, Variable> {
        match role {
            VariableRole::Input => &mut self.inputs,
            VariableRole::Output => &mut self.outputs,
        }
    }

    /// Register an empty variable. Rejects duplicate names within the role.
    pub fn add_variable(
        &mut self,
        role: VariableRole,
        name: impl Into<String>,
        universe: (f64, f64),
    ) -> FuzzyResult<()> {
        let variable = Variable::new(name, role, universe)?;
        if self.map(role).contains_key(variable.name()) {
            return Err(FuzzyError::DuplicateVariable {
                role,
                variable: variable.name().to_string(),
            });
        }
        debug!(role = %role, variable = variable.name(), "registered variable");
        self.map_mut(role).insert(variable.name().to_string(), variable);
        Ok(())
    }

    /// Remove a variable and all terms it owns.
    pub fn remove_variable(&mut self, role: VariableRole, name: &str) -> FuzzyResult<Variable> {
        self.map_mut(role)
            .shift_remove(name)
            .ok_or_else(|| FuzzyError::UnknownVariable {
                role,
                variable: name.to_string(),
            })
    }

    /// Register a membership function under `(variable, term)`. Rejects a
    /// duplicate term name; replacement is spelled `remove_term` + `add_term`.
    pub fn add_term(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: impl Into<String>,
        mf: MembershipFunction,
    ) -> FuzzyResult<()> {
        let term = term.into();
        debug!(role = %role, variable, term = term.as_str(), %mf, "adding term");
        self.get_mut(role, variable)?.add_term(term, mf)
    }

    /// Remove `(variable, term)` and release its membership function.
    ///
    /// Rule consistency is the engine layer's concern; see
    /// [`FuzzyEngine::remove_term`](crate::engine::FuzzyEngine::remove_term).
    pub fn remove_term(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: &str,
    ) -> FuzzyResult<MembershipFunction> {
        debug!(role = %role, variable, term, "removing term");
        self.get_mut(role, variable)?.remove_term(term)
    }

    pub fn get(&self, role: VariableRole, name: &str) -> FuzzyResult<&Variable> {
        self.map(role)
            .get(name)
            .ok_or_else(|| FuzzyError::UnknownVariable {
                role,
                variable: name.to_string(),
            })
    }

    fn get_mut(&mut self, role: VariableRole, name: &str) -> FuzzyResult<&mut Variable> {
        self.map_mut(role)
            .get_mut(name)
            .ok_or_else(|| FuzzyError::UnknownVariable {
                role,
                variable: name.to_string(),
            })
    }

    /// Read-only view of a variable's term map.
    pub fn terms(
        &self,
        role: VariableRole,
        variable: &str,
    ) -> FuzzyResult<&IndexMap<String, MembershipFunction>> {
        Ok(self.get(role, variable)?.terms())
    }

    /// Evaluate the stored membership function for `(variable, term)` at
    /// `value`.
    pub fn degree_of(
        &self,
        role: VariableRole,
        variable: &str,
        term: &str,
        value: f64,
    ) -> FuzzyResult<f64> {
        self.get(role, variable)?.degree_of(term, value)
    }

    pub fn contains_term(&self, role: VariableRole, variable: &str, term: &str) -> bool {
        self.map(role)
            .get(variable)
            .is_some_and(|v| v.terms().contains_key(term))
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Input variables in registration order.
    pub fn inputs(&self) -> impl Iterator<Item = &Variable> {
        self.inputs.values()
    }

    /// Output variables in registration order.
    pub fn outputs(&self) -> impl Iterator<Item = &Variable> {
        self.outputs.values()
    }

    /// Fuzzify a crisp input vector against every registered input term.
    ///
    /// `input[i]` is matched to the i-th registered input variable.
    pub fn fuzzify(&self, input: &[f64]) -> FuzzyResult<Fuzzified<'_>> {
        if input.len() != self.inputs.len() {
            return Err(FuzzyError::DimensionMismatch {
                expected: self.inputs.len(),
                actual: input.len(),
            });
        }
        let mut variables = Vec::with_capacity(self.inputs.len());
        for (var, &x) in self.inputs.values().zip(input) {
            if !x.is_finite() {
                return Err(FuzzyError::NonFiniteInput {
                    variable: var.name().to_string(),
                    value: x,
                });
            }
            let degrees = var
                .terms()
                .iter()
                .map(|(term, mf)| (term.as_str(), mf.degree(x)))
                .collect();
            variables.push((var.name(), degrees));
        }
        Ok(Fuzzified { variables })
    }
}
