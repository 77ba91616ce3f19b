//! # fuzzic
//!
//! A Mamdani-style fuzzy inference engine: crisp inputs are fuzzified
//! against linguistically named membership functions, combined through a
//! validated rule table, aggregated per output term, and defuzzified back
//! into crisp outputs.
//!
//! ## Pipeline
//!
//! 1. **Fuzzification**: every input variable's terms are evaluated at the
//!    corresponding scalar of the input vector ([`VariableRegistry::fuzzify`]).
//! 2. **Rule firing**: each rule's antecedent degrees are folded through the
//!    configured t-norm and scaled by the rule weight
//!    ([`RuleTable::evaluate`]).
//! 3. **Aggregation**: conclusions are grouped per output term and combined
//!    through the configured s-norm.
//! 4. **Defuzzification**: the aggregated curve is sampled over the output
//!    universe and reduced to a crisp value ([`defuzz::defuzzify`]).
//!
//! Configuration errors (unknown names, duplicate terms, dangling rule
//! references) are rejected eagerly at the mutating call; evaluation is a
//! deterministic, call-local function of the configuration and the input.
//!
//! ## Quick start
//!
//! ```rust
//! use fuzzic::{FuzzyEngine, MembershipFunction, Rule, TermRef, VariableRole};
//!
//! let mut engine = FuzzyEngine::new();
//! engine.add_input("temperature", (0.0, 30.0))?;
//! engine.add_output("fan", (0.0, 100.0))?;
//!
//! engine.add_term(
//!     VariableRole::Input,
//!     "temperature",
//!     "cold",
//!     MembershipFunction::triangular(0.0, 0.0, 20.0)?,
//! )?;
//! engine.add_term(
//!     VariableRole::Input,
//!     "temperature",
//!     "hot",
//!     MembershipFunction::triangular(10.0, 30.0, 30.0)?,
//! )?;
//! engine.add_term(
//!     VariableRole::Output,
//!     "fan",
//!     "off",
//!     MembershipFunction::singleton(0.0)?,
//! )?;
//! engine.add_term(
//!     VariableRole::Output,
//!     "fan",
//!     "high",
//!     MembershipFunction::singleton(100.0)?,
//! )?;
//!
//! engine.add_rule(Rule::new(
//!     vec![TermRef::new("temperature", "cold")],
//!     TermRef::new("fan", "off"),
//! )?)?;
//! engine.add_rule(Rule::new(
//!     vec![TermRef::new("temperature", "hot")],
//!     TermRef::new("fan", "high"),
//! )?)?;
//!
//! let output = engine.simulate_slice(&[25.0])?;
//! assert!(output[0] > 95.0);
//! # Ok::<(), fuzzic::FuzzyError>(())
//! ```
//!
//! ## Concurrency
//!
//! `simulate` borrows the engine immutably and keeps all evaluation state on
//! the call stack, so concurrent read-only evaluation needs no locking.
//! Mutators borrow mutably; wrap the engine in a reader-writer lock if the
//! configuration must change while evaluators are running.

pub mod defuzz;
pub mod engine;
pub mod error;
pub mod membership;
pub mod norms;
pub mod rules;
pub mod variable;

pub use defuzz::{AggregatedSet, Conclusion, DefuzzMethod, FallbackPolicy};
pub use engine::{EngineConfig, FuzzyEngine, DEFAULT_RESOLUTION};
pub use error::{FuzzyError, FuzzyResult};
pub use membership::MembershipFunction;
pub use norms::{SNorm, TNorm};
pub use rules::{Firing, Rule, RuleTable, TermRef};
pub use variable::{Fuzzified, Variable, VariableRegistry, VariableRole};
