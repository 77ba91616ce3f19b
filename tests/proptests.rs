//! Property-based tests for the fuzzy engine
//!
//! These use proptest to validate invariants that should hold for all
//! membership shapes, operator families and inputs.

use proptest::prelude::*;

use fuzzic::{
    FuzzyEngine, MembershipFunction, Rule, SNorm, TNorm, TermRef, VariableRole,
};

// ===== Strategies for generating test data =====

/// Finite, reasonably sized universe values
fn arb_value() -> impl Strategy<Value = f64> {
    -1e3..1e3f64
}

/// Three sorted break points with non-zero total width
fn arb_triangle_params() -> impl Strategy<Value = (f64, f64, f64)> {
    (arb_value(), arb_value(), arb_value())
        .prop_map(|(a, b, c)| {
            let mut points = [a, b, c];
            points.sort_by(|x, y| x.partial_cmp(y).unwrap());
            (points[0], points[1], points[2])
        })
        .prop_filter("zero-width triangle", |(a, _, c)| a < c)
}

fn arb_membership() -> impl Strategy<Value = MembershipFunction> {
    prop_oneof![
        arb_triangle_params()
            .prop_map(|(a, b, c)| MembershipFunction::triangular(a, b, c).unwrap()),
        (arb_value(), 0.01..100.0f64)
            .prop_map(|(mean, sigma)| MembershipFunction::gaussian(mean, sigma).unwrap()),
        arb_value().prop_map(|v| MembershipFunction::singleton(v).unwrap()),
    ]
}

fn arb_degree() -> impl Strategy<Value = f64> {
    0.0..=1.0f64
}

fn arb_tnorm() -> impl Strategy<Value = TNorm> {
    prop_oneof![
        Just(TNorm::Minimum),
        Just(TNorm::Product),
        Just(TNorm::Lukasiewicz),
    ]
}

fn arb_snorm() -> impl Strategy<Value = SNorm> {
    prop_oneof![
        Just(SNorm::Maximum),
        Just(SNorm::ProbabilisticSum),
        Just(SNorm::BoundedSum),
    ]
}

// ===== Property Tests =====

proptest! {
    #[test]
    fn prop_degree_in_unit_interval(mf in arb_membership(), x in arb_value()) {
        let degree = mf.degree(x);
        prop_assert!((0.0..=1.0).contains(&degree), "degree {} out of range for {}", degree, mf);
    }

    #[test]
    fn prop_singleton_is_one_only_at_its_point(value in arb_value(), x in arb_value()) {
        let mf = MembershipFunction::singleton(value).unwrap();
        if x == value {
            prop_assert_eq!(mf.degree(x), 1.0);
        } else {
            prop_assert_eq!(mf.degree(x), 0.0);
        }
    }

    #[test]
    fn prop_tnorm_bounded_and_commutative(norm in arb_tnorm(), a in arb_degree(), b in arb_degree()) {
        let ab = norm.apply(a, b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!(ab <= a.min(b) + 1e-12, "t-norm exceeded min: {} > min({}, {})", ab, a, b);
        prop_assert_eq!(ab, norm.apply(b, a));
    }

    #[test]
    fn prop_snorm_bounded_and_commutative(norm in arb_snorm(), a in arb_degree(), b in arb_degree()) {
        let ab = norm.apply(a, b);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&ab));
        prop_assert!(ab >= a.max(b) - 1e-12, "s-norm fell below max: {} < max({}, {})", ab, a, b);
        prop_assert_eq!(ab, norm.apply(b, a));
    }

    #[test]
    fn prop_norm_identities(norm in arb_tnorm(), conorm in arb_snorm(), a in arb_degree()) {
        prop_assert!((norm.apply(a, TNorm::IDENTITY) - a).abs() < 1e-12);
        prop_assert!((conorm.apply(a, SNorm::IDENTITY) - a).abs() < 1e-12);
    }

    #[test]
    fn prop_simulate_is_deterministic_and_in_universe(x in 0.0..30.0f64) {
        let engine = overlapping_engine();

        let first = engine.simulate_slice(&[x]).unwrap();
        let second = engine.simulate_slice(&[x]).unwrap();
        prop_assert_eq!(&first, &second);

        // Crisp output stays inside the output universe
        prop_assert!((0.0..=100.0).contains(&first[0]), "output {} escaped universe", first[0]);
    }

    #[test]
    fn prop_fuzzify_covers_every_term(x in 0.0..30.0f64) {
        let engine = overlapping_engine();
        let fuzzified = engine.registry().fuzzify(&[x]).unwrap();

        for variable in engine.registry().inputs() {
            for term in variable.terms().keys() {
                let degree = fuzzified.degree(variable.name(), term);
                prop_assert!(degree.is_some());
                prop_assert!((0.0..=1.0).contains(&degree.unwrap()));
            }
        }
    }
}

/// Single-input engine whose trapezoidal terms cover the whole universe, so
/// every input fires at least one rule.
fn overlapping_engine() -> FuzzyEngine {
    let mut engine = FuzzyEngine::new();
    engine.add_input("temperature", (0.0, 30.0)).unwrap();
    engine.add_output("fan", (0.0, 100.0)).unwrap();
    engine
        .add_term(
            VariableRole::Input,
            "temperature",
            "cold",
            MembershipFunction::trapezoidal(0.0, 0.0, 10.0, 20.0).unwrap(),
        )
        .unwrap();
    engine
        .add_term(
            VariableRole::Input,
            "temperature",
            "hot",
            MembershipFunction::trapezoidal(10.0, 20.0, 30.0, 30.0).unwrap(),
        )
        .unwrap();
    engine
        .add_term(
            VariableRole::Output,
            "fan",
            "low",
            MembershipFunction::triangular(0.0, 0.0, 50.0).unwrap(),
        )
        .unwrap();
    engine
        .add_term(
            VariableRole::Output,
            "fan",
            "high",
            MembershipFunction::triangular(50.0, 100.0, 100.0).unwrap(),
        )
        .unwrap();
    engine
        .add_rule(
            Rule::new(
                vec![TermRef::new("temperature", "cold")],
                TermRef::new("fan", "low"),
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
