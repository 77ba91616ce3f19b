//! Typed rule records and the rule table.
//!
//! A rule is IF `antecedents` (conjunctive) THEN `consequent`, with a weight
//! in \[0,1\]. The table is an ordered array of these typed records; every
//! `(variable, term)` reference is validated against the registry when the
//! rule is added, never lazily.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FuzzyError, FuzzyResult};
use crate::norms::TNorm;
use crate::variable::{Fuzzified, VariableRegistry, VariableRole};

/// A `(variable, term)` name pair inside a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRef {
    pub variable: String,
    pub term: String,
}

impl TermRef {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

impl fmt::Display for TermRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.term)
    }
}

/// One fuzzy rule: conjunctive antecedents over input terms, a single output
/// consequent, and a firing weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    antecedents: Vec<TermRef>,
    consequent: TermRef,
    weight: f64,
}

impl Rule {
    /// Rule with full weight.
    pub fn new(antecedents: Vec<TermRef>, consequent: TermRef) -> FuzzyResult<Self> {
        Self::with_weight(antecedents, consequent, 1.0)
    }

    /// Rule with an explicit weight in \[0,1\].
    pub fn with_weight(
        antecedents: Vec<TermRef>,
        consequent: TermRef,
        weight: f64,
    ) -> FuzzyResult<Self> {
        if antecedents.is_empty() {
            return Err(FuzzyError::EmptyAntecedent);
        }
        if !(0.0..=1.0).contains(&weight) || !weight.is_finite() {
            return Err(FuzzyError::InvalidWeight { weight });
        }
        Ok(Self {
            antecedents,
            consequent,
            weight,
        })
    }

    pub fn antecedents(&self) -> &[TermRef] {
        &self.antecedents
    }

    pub fn consequent(&self) -> &TermRef {
        &self.consequent
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    fn references(&self, role: VariableRole, variable: &str, term: &str) -> bool {
        match role {
            VariableRole::Input => self
                .antecedents
                .iter()
                .any(|a| a.variable == variable && a.term == term),
            VariableRole::Output => {
                self.consequent.variable == variable && self.consequent.term == term
            }
        }
    }

    fn references_variable(&self, role: VariableRole, variable: &str) -> bool {
        match role {
            VariableRole::Input => self.antecedents.iter().any(|a| a.variable == variable),
            VariableRole::Output => self.consequent.variable == variable,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ")?;
        for (i, antecedent) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{antecedent}")?;
        }
        write!(f, " THEN {}", self.consequent)?;
        if self.weight != 1.0 {
            write!(f, " (weight {})", self.weight)?;
        }
        Ok(())
    }
}

/// One rule conclusion produced by [`RuleTable::evaluate`]: the consequent
/// `(variable, term)` pair and the rule's weighted firing strength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Firing<'a> {
    pub variable: &'a str,
    pub term: &'a str,
    pub strength: f64,
}

/// Ordered collection of rules with add-time validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every reference of `rule` against the registry and append it.
    /// Returns the new rule's index.
    pub fn add_rule(&mut self, rule: Rule, registry: &VariableRegistry) -> FuzzyResult<usize> {
        for antecedent in rule.antecedents() {
            if !registry.contains_term(VariableRole::Input, &antecedent.variable, &antecedent.term)
            {
                return Err(FuzzyError::InvalidRuleReference {
                    role: VariableRole::Input,
                    variable: antecedent.variable.clone(),
                    term: antecedent.term.clone(),
                });
            }
        }
        let consequent = rule.consequent();
        if !registry.contains_term(VariableRole::Output, &consequent.variable, &consequent.term) {
            return Err(FuzzyError::InvalidRuleReference {
                role: VariableRole::Output,
                variable: consequent.variable.clone(),
                term: consequent.term.clone(),
            });
        }
        debug!(rule = %rule, index = self.rules.len(), "adding rule");
        self.rules.push(rule);
        Ok(self.rules.len() - 1)
    }

    /// Remove the rule at `index`; later rules shift down by one.
    pub fn remove_rule(&mut self, index: usize) -> FuzzyResult<Rule> {
        if index >= self.rules.len() {
            return Err(FuzzyError::UnknownRule {
                index,
                len: self.rules.len(),
            });
        }
        Ok(self.rules.remove(index))
    }

    /// Indices of rules referencing `(variable, term)` on the given side.
    pub fn rules_referencing(
        &self,
        role: VariableRole,
        variable: &str,
        term: &str,
    ) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.references(role, variable, term))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of rules referencing any term of `variable` on the given side.
    pub fn rules_referencing_variable(&self, role: VariableRole, variable: &str) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.references_variable(role, variable))
            .map(|(i, _)| i)
            .collect()
    }

    /// Drop every rule referencing `(variable, term)` on the given side.
    /// Returns the number of rules removed.
    pub fn remove_rules_referencing(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: &str,
    ) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| !r.references(role, variable, term));
        let removed = before - self.rules.len();
        if removed > 0 {
            debug!(role = %role, variable, term, removed, "cascaded rule removal");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Evaluate every rule against a fuzzification result.
    ///
    /// Firing strength = t-norm fold over the antecedent degrees, scaled by
    /// the rule weight. One [`Firing`] per rule is appended to `out`, which
    /// is cleared first and can be reused across calls to keep the O(R·K)
    /// hot path allocation-free.
    pub fn evaluate<'t>(
        &'t self,
        fuzzified: &Fuzzified<'_>,
        tnorm: TNorm,
        out: &mut Vec<Firing<'t>>,
    ) -> FuzzyResult<()> {
        out.clear();
        for rule in &self.rules {
            let mut strength = TNorm::IDENTITY;
            for antecedent in &rule.antecedents {
                let degree = fuzzified
                    .degree(&antecedent.variable, &antecedent.term)
                    .ok_or_else(|| FuzzyError::UnknownTerm {
                        variable: antecedent.variable.clone(),
                        term: antecedent.term.clone(),
                    })?;
                strength = tnorm.apply(strength, degree);
            }
            strength *= rule.weight;
            trace!(rule = %rule, strength, "rule fired");
            out.push(Firing {
                variable: &rule.consequent.variable,
                term: &rule.consequent.term,
                strength,
            });
        }
        Ok(())
    }
}
