//! The inference engine: orchestration of fuzzification, rule firing,
//! aggregation and defuzzification.
//!
//! [`FuzzyEngine`] owns a [`VariableRegistry`] and a [`RuleTable`] and keeps
//! them mutually consistent: rules are validated when added, and terms (or
//! variables) cannot be removed while a rule still references them unless the
//! cascade form is used. Evaluation is a pure function of the configuration
//! and the input: `simulate` takes `&self`, holds no state between calls and
//! is safe to run concurrently from multiple threads, while every mutator
//! takes `&mut self`, so the exclusive-access requirement for configuration
//! changes is enforced at compile time.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::defuzz::{self, Conclusion, DefuzzMethod, FallbackPolicy};
use crate::error::{FuzzyError, FuzzyResult};
use crate::membership::MembershipFunction;
use crate::norms::{SNorm, TNorm};
use crate::rules::{Firing, Rule, RuleTable};
use crate::variable::{Variable, VariableRegistry, VariableRole};

/// Default number of samples for defuzzification curves.
pub const DEFAULT_RESOLUTION: usize = 201;

/// Operator and defuzzification configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fuzzy AND combining a rule's antecedent degrees.
    pub tnorm: TNorm,
    /// Fuzzy OR aggregating conclusions per output term, and reconstructing
    /// the aggregated curve during defuzzification.
    pub snorm: SNorm,
    /// Defuzzification strategy.
    pub defuzz: DefuzzMethod,
    /// Sample count for the defuzzification curve. Tune down to bound
    /// per-call cost for large rule bases, up for finer crisp outputs.
    pub resolution: usize,
    /// Recovery policy when an output has no usable conclusion.
    pub fallback: FallbackPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tnorm: TNorm::Minimum,
            snorm: SNorm::Maximum,
            defuzz: DefuzzMethod::Centroid,
            resolution: DEFAULT_RESOLUTION,
            fallback: FallbackPolicy::Fail,
        }
    }
}

impl EngineConfig {
    pub fn with_tnorm(mut self, tnorm: TNorm) -> Self {
        self.tnorm = tnorm;
        self
    }

    pub fn with_snorm(mut self, snorm: SNorm) -> Self {
        self.snorm = snorm;
        self
    }

    pub fn with_defuzz(mut self, defuzz: DefuzzMethod) -> Self {
        self.defuzz = defuzz;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn validate(&self) -> FuzzyResult<()> {
        if self.resolution < 2 {
            return Err(FuzzyError::InvalidResolution {
                samples: self.resolution,
            });
        }
        Ok(())
    }
}

/// A Mamdani-style fuzzy inference engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyEngine {
    registry: VariableRegistry,
    rules: RuleTable,
    config: EngineConfig,
}

impl FuzzyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> FuzzyResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: VariableRegistry::new(),
            rules: RuleTable::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) -> FuzzyResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Register an input variable over the given crisp universe.
    pub fn add_input(&mut self, name: impl Into<String>, universe: (f64, f64)) -> FuzzyResult<()> {
        self.registry
            .add_variable(VariableRole::Input, name, universe)
    }

    /// Register an output variable over the given crisp universe.
    pub fn add_output(&mut self, name: impl Into<String>, universe: (f64, f64)) -> FuzzyResult<()> {
        self.registry
            .add_variable(VariableRole::Output, name, universe)
    }

    /// Register a linguistic term under an existing variable.
    pub fn add_term(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: impl Into<String>,
        mf: MembershipFunction,
    ) -> FuzzyResult<()> {
        self.registry.add_term(role, variable, term, mf)
    }

    /// Remove a term, rejecting the removal while any rule references it.
    ///
    /// Use [`remove_term_cascade`](Self::remove_term_cascade) to drop the
    /// referencing rules along with the term.
    pub fn remove_term(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: &str,
    ) -> FuzzyResult<MembershipFunction> {
        if !self.registry.contains_term(role, variable, term) {
            // Distinguish the unknown-key error from the policy error
            return self.registry.remove_term(role, variable, term);
        }
        let referencing = self.rules.rules_referencing(role, variable, term);
        if !referencing.is_empty() {
            return Err(FuzzyError::TermInUse {
                variable: variable.to_string(),
                term: term.to_string(),
                rules: referencing,
            });
        }
        self.registry.remove_term(role, variable, term)
    }

    /// Remove a term together with every rule referencing it. Returns the
    /// released membership function and the number of rules removed.
    pub fn remove_term_cascade(
        &mut self,
        role: VariableRole,
        variable: &str,
        term: &str,
    ) -> FuzzyResult<(MembershipFunction, usize)> {
        if !self.registry.contains_term(role, variable, term) {
            return self.registry.remove_term(role, variable, term).map(|mf| (mf, 0));
        }
        let removed_rules = self.rules.remove_rules_referencing(role, variable, term);
        let mf = self.registry.remove_term(role, variable, term)?;
        Ok((mf, removed_rules))
    }

    /// Remove a variable and all its terms, rejecting the removal while any
    /// rule references the variable.
    pub fn remove_variable(&mut self, role: VariableRole, name: &str) -> FuzzyResult<Variable> {
        let referencing = self.rules.rules_referencing_variable(role, name);
        if !referencing.is_empty() {
            return Err(FuzzyError::VariableInUse {
                variable: name.to_string(),
                rules: referencing,
            });
        }
        self.registry.remove_variable(role, name)
    }

    /// Validate and append a rule. Returns its index.
    pub fn add_rule(&mut self, rule: Rule) -> FuzzyResult<usize> {
        self.rules.add_rule(rule, &self.registry)
    }

    pub fn remove_rule(&mut self, index: usize) -> FuzzyResult<Rule> {
        self.rules.remove_rule(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.registry.num_inputs()
    }

    pub fn num_outputs(&self) -> usize {
        self.registry.num_outputs()
    }

    pub fn num_variables(&self) -> usize {
        self.num_inputs() + self.num_outputs()
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    fn ensure_configured(&self) -> FuzzyResult<()> {
        if self.registry.num_inputs() == 0 {
            return Err(FuzzyError::NotConfigured {
                reason: "no input variables registered".to_string(),
            });
        }
        if self.registry.num_outputs() == 0 {
            return Err(FuzzyError::NotConfigured {
                reason: "no output variables registered".to_string(),
            });
        }
        for variable in self.registry.inputs().chain(self.registry.outputs()) {
            if variable.terms().is_empty() {
                return Err(FuzzyError::NotConfigured {
                    reason: format!(
                        "{} variable '{}' has no terms",
                        variable.role(),
                        variable.name()
                    ),
                });
            }
        }
        if self.rules.is_empty() {
            return Err(FuzzyError::NotConfigured {
                reason: "rule table is empty".to_string(),
            });
        }
        self.config.validate()
    }

    /// Run the four-stage pipeline on one crisp input vector.
    ///
    /// `input[i]` corresponds to the i-th registered input variable; the
    /// result's j-th element to the j-th registered output variable.
    /// Deterministic: identical configuration and input produce bit-identical
    /// output.
    pub fn simulate_slice(&self, input: &[f64]) -> FuzzyResult<Vec<f64>> {
        self.ensure_configured()?;

        let fuzzified = self.registry.fuzzify(input)?;
        trace!(inputs = fuzzified.len(), "fuzzified input vector");

        let mut firings: Vec<Firing<'_>> = Vec::with_capacity(self.rules.len());
        self.rules
            .evaluate(&fuzzified, self.config.tnorm, &mut firings)?;

        let mut output = Vec::with_capacity(self.registry.num_outputs());
        for variable in self.registry.outputs() {
            let mut conclusion = Conclusion::new();
            for firing in &firings {
                if firing.variable == variable.name() && firing.strength > 0.0 {
                    conclusion.accumulate(firing.term, firing.strength, self.config.snorm);
                }
            }
            let crisp = defuzz::defuzzify(&conclusion, variable, &self.config)?;
            trace!(output = variable.name(), crisp, "defuzzified");
            output.push(crisp);
        }

        debug!(?input, ?output, "simulate");
        Ok(output)
    }

    /// Vector form of [`simulate_slice`](Self::simulate_slice).
    pub fn simulate(&self, input: &Array1<f64>) -> FuzzyResult<Array1<f64>> {
        let values: Vec<f64> = input.iter().copied().collect();
        Ok(Array1::from(self.simulate_slice(&values)?))
    }

    /// Single-input single-output convenience form.
    pub fn simulate_one(&self, x: f64) -> FuzzyResult<f64> {
        if self.num_inputs() != 1 {
            return Err(FuzzyError::DimensionMismatch {
                expected: 1,
                actual: self.num_inputs(),
            });
        }
        if self.num_outputs() != 1 {
            return Err(FuzzyError::DimensionMismatch {
                expected: 1,
                actual: self.num_outputs(),
            });
        }
        Ok(self.simulate_slice(&[x])?[0])
    }

    /// Sweep a single-input engine over a linearly spaced range, useful for
    /// plotting transfer curves.
    ///
    /// Returns one row per sample: column 0 is the swept input value, the
    /// remaining columns are the outputs in registration order.
    pub fn simulate_range(&self, lmin: f64, lmax: f64, step: f64) -> FuzzyResult<Array2<f64>> {
        self.ensure_configured()?;
        if self.num_inputs() != 1 {
            return Err(FuzzyError::DimensionMismatch {
                expected: 1,
                actual: self.num_inputs(),
            });
        }
        if !(lmin.is_finite() && lmax.is_finite() && step.is_finite() && step > 0.0 && lmin < lmax)
        {
            return Err(FuzzyError::InvalidRange { lmin, lmax, step });
        }

        // Tolerate the division landing just below an integer so the endpoint
        // is included for steps like 0.1 that have no exact binary form.
        let samples = ((lmax - lmin) / step + 1e-9).floor() as usize + 1;
        let cols = 1 + self.num_outputs();
        let mut sweep = Array2::zeros((samples, cols));
        for i in 0..samples {
            let x = lmin + i as f64 * step;
            let output = self.simulate_slice(&[x])?;
            sweep[[i, 0]] = x;
            for (j, &y) in output.iter().enumerate() {
                sweep[[i, 1 + j]] = y;
            }
        }
        Ok(sweep)
    }
}

impl fmt::Display for FuzzyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FuzzyEngine: {} inputs, {} outputs, {} rules",
            self.num_inputs(),
            self.num_outputs(),
            self.num_rules()
        )?;
        writeln!(
            f,
            "  config: tnorm={} snorm={} defuzz={} resolution={} fallback={}",
            self.config.tnorm,
            self.config.snorm,
            self.config.defuzz,
            self.config.resolution,
            self.config.fallback
        )?;
        for variable in self.registry.inputs().chain(self.registry.outputs()) {
            let (min, max) = variable.universe();
            writeln!(
                f,
                "  {} {} [{}, {}]:",
                variable.role(),
                variable.name(),
                min,
                max
            )?;
            for (term, mf) in variable.terms() {
                writeln!(f, "    {term}: {mf}")?;
            }
        }
        writeln!(f, "  rules:")?;
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "    [{i}] {rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::TermRef;

    fn fan_engine() -> FuzzyEngine {
        let mut engine = FuzzyEngine::new();
        engine.add_input("temperature", (0.0, 30.0)).unwrap();
        engine.add_output("fan", (0.0, 100.0)).unwrap();
        engine
            .add_term(
                VariableRole::Input,
                "temperature",
                "cold",
                MembershipFunction::triangular(0.0, 0.0, 20.0).unwrap(),
            )
            .unwrap();
        engine
            .add_term(
                VariableRole::Input,
                "temperature",
                "hot",
                MembershipFunction::triangular(10.0, 30.0, 30.0).unwrap(),
            )
            .unwrap();
        engine
            .add_term(
                VariableRole::Output,
                "fan",
                "off",
                MembershipFunction::singleton(0.0).unwrap(),
            )
            .unwrap();
        engine
            .add_term(
                VariableRole::Output,
                "fan",
                "high",
                MembershipFunction::singleton(100.0).unwrap(),
            )
            .unwrap();
        engine
            .add_rule(
                Rule::new(
                    vec![TermRef::new("temperature", "cold")],
                    TermRef::new("fan", "off"),
                )
                .unwrap(),
            )
            .unwrap();
        engine
            .add_rule(
                Rule::new(
                    vec![TermRef::new("temperature", "hot")],
                    TermRef::new("fan", "high"),
                )
                .unwrap(),
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(matches!(
            EngineConfig::default().with_resolution(1).validate(),
            Err(FuzzyError::InvalidResolution { samples: 1 })
        ));
        assert!(FuzzyEngine::with_config(EngineConfig::default().with_resolution(0)).is_err());
    }

    #[test]
    fn test_unconfigured_engine_fails() {
        let empty = FuzzyEngine::new();
        assert!(matches!(
            empty.simulate_slice(&[]),
            Err(FuzzyError::NotConfigured { .. })
        ));

        // Variable with zero terms is unconfigured, not silently zero
        let mut engine = fan_engine();
        engine.add_input("humidity", (0.0, 100.0)).unwrap();
        let err = engine.simulate_slice(&[25.0, 50.0]).unwrap_err();
        assert!(matches!(err, FuzzyError::NotConfigured { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let engine = fan_engine();
        assert!(matches!(
            engine.simulate_slice(&[25.0, 1.0]),
            Err(FuzzyError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_simulate_forms_agree() {
        let engine = fan_engine();

        let from_slice = engine.simulate_slice(&[25.0]).unwrap();
        let from_vec = engine.simulate(&Array1::from(vec![25.0])).unwrap();
        let from_one = engine.simulate_one(25.0).unwrap();

        assert_eq!(from_slice[0], from_vec[0]);
        assert_eq!(from_slice[0], from_one);
    }

    #[test]
    fn test_simulate_range_shape() {
        let engine = fan_engine();
        let sweep = engine.simulate_range(0.0, 30.0, 5.0).unwrap();

        assert_eq!(sweep.dim(), (7, 2));
        assert_eq!(sweep[[0, 0]], 0.0);
        assert_eq!(sweep[[6, 0]], 30.0);
        // Cold end drives the fan low, hot end drives it high
        assert!(sweep[[0, 1]] < 5.0);
        assert!(sweep[[6, 1]] > 95.0);

        assert!(matches!(
            engine.simulate_range(30.0, 0.0, 5.0),
            Err(FuzzyError::InvalidRange { .. })
        ));
        assert!(engine.simulate_range(0.0, 30.0, 0.0).is_err());
    }

    #[test]
    fn test_counts() {
        let engine = fan_engine();
        assert_eq!(engine.num_inputs(), 1);
        assert_eq!(engine.num_outputs(), 1);
        assert_eq!(engine.num_variables(), 2);
        assert_eq!(engine.num_rules(), 2);
    }

    #[test]
    fn test_remove_term_policy() {
        let mut engine = fan_engine();

        let err = engine
            .remove_term(VariableRole::Input, "temperature", "hot")
            .unwrap_err();
        assert_eq!(
            err,
            FuzzyError::TermInUse {
                variable: "temperature".to_string(),
                term: "hot".to_string(),
                rules: vec![1],
            }
        );

        // Unknown keys are reported as such, not as policy errors
        assert!(matches!(
            engine.remove_term(VariableRole::Input, "temperature", "tepid"),
            Err(FuzzyError::UnknownTerm { .. })
        ));
    }

    #[test]
    fn test_remove_term_cascade() {
        let mut engine = fan_engine();

        let (mf, removed) = engine
            .remove_term_cascade(VariableRole::Input, "temperature", "hot")
            .unwrap();
        assert_eq!(mf, MembershipFunction::triangular(10.0, 30.0, 30.0).unwrap());
        assert_eq!(removed, 1);
        assert_eq!(engine.num_rules(), 1);

        // The surviving rule can no longer be shadowed by the removed term
        let out = engine.simulate_slice(&[5.0]).unwrap();
        assert!(out[0] < 5.0);
    }

    #[test]
    fn test_remove_variable_policy() {
        let mut engine = fan_engine();
        assert!(matches!(
            engine.remove_variable(VariableRole::Output, "fan"),
            Err(FuzzyError::VariableInUse { .. })
        ));

        engine.remove_rule(1).unwrap();
        engine.remove_rule(0).unwrap();
        let fan = engine.remove_variable(VariableRole::Output, "fan").unwrap();
        assert_eq!(fan.name(), "fan");
    }

    #[test]
    fn test_display_dump() {
        let dump = fan_engine().to_string();
        assert!(dump.contains("1 inputs, 1 outputs, 2 rules"));
        assert!(dump.contains("input temperature [0, 30]"));
        assert!(dump.contains("cold: triangular(0, 0, 20)"));
        assert!(dump.contains("[1] IF temperature IS hot THEN fan IS high"));
    }
}
