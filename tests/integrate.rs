mod common;

use common::{assert_antiderivative, found, integrate_str};
use icas::{
    equivalent, evaluate_integral, integrate_expr, parse_expr, CancelToken, CasError, Expr,
    IntegrationLimits, Outcome,
};

#[test]
fn integrates_polynomials_termwise() {
    let result = found("x^3 + 2*x - 7");
    assert!(equivalent(
        &result,
        &parse_expr("x^4/4 + x^2 - 7*x").unwrap()
    ));
}

#[test]
fn monomial_shortcut_covers_negative_and_fractional_powers() {
    assert!(equivalent(&found("x^-1"), &parse_expr("log(abs(x))").unwrap()));
    assert_antiderivative("x^-3");
    assert_antiderivative("sqrt(x)");
}

#[test]
fn pulls_variable_free_factors_out() {
    let result = found("3*y*cos(x)");
    assert!(equivalent(&result, &parse_expr("3*y*sin(x)").unwrap()));
}

#[test]
fn treats_foreign_expressions_as_constants() {
    let expr = parse_expr("x*sin(x)").unwrap();
    let outcome = integrate_expr(
        "y",
        &expr,
        &IntegrationLimits::default(),
        &CancelToken::new(),
    )
    .unwrap();
    let Outcome::Found(result) = outcome else {
        panic!("expected constant integration");
    };
    assert!(equivalent(&result, &parse_expr("x*sin(x)*y").unwrap()));
}

#[test]
fn linearity_splits_sums_of_resolvable_terms() {
    // ∫(f + g) agrees with ∫f + ∫g whenever both sides resolve.
    let combined = found("sin(x) + exp(2*x)");
    let separate = Expr::Add(found("sin(x)").boxed(), found("exp(2*x)").boxed());
    assert!(equivalent(&combined, &separate));
}

#[test]
fn substitution_handles_the_classic_example() {
    let result = found("x^2*exp(x^3)");
    assert!(equivalent(&result, &parse_expr("exp(x^3)/3").unwrap()));
}

#[test]
fn substitution_round_trips_composites() {
    assert_antiderivative("2*x*exp(x^2)");
    assert_antiderivative("cos(x)*sin(x)^4");
    assert_antiderivative("(2*x + 5)/(x^2 + 5*x + 1)^3");
}

#[test]
fn log_derivative_shortcut_fires() {
    let result = found("(2*x)/(x^2 + 7)");
    assert!(equivalent(
        &result,
        &parse_expr("log(abs(x^2 + 7))").unwrap()
    ));
}

#[test]
fn partial_integration_round_trips() {
    assert_antiderivative("x*sin(x)");
    assert_antiderivative("x*log(x)");
    assert_antiderivative("x^2*exp(x)");
    assert_antiderivative("x*atan(x)");
    assert_antiderivative("log(x)/x^2");
}

#[test]
fn power_reduction_base_cases_match() {
    assert!(equivalent(&found("sin(x)"), &parse_expr("-cos(x)").unwrap()));
    assert!(equivalent(
        &found("sin(x)^2"),
        &parse_expr("x/2 - sin(2*x)/4").unwrap()
    ));
}

#[test]
fn constant_base_powers_normalize_to_exponentials() {
    assert_antiderivative("2^x");
}

#[test]
fn unintegrable_inputs_are_reported_not_guessed() {
    // No tactic handles exp(x^2); the honest answer is the original node.
    assert!(matches!(integrate_str("exp(x^2)"), Outcome::NotFound));

    let node = icas::IntegralNode {
        integrand: parse_expr("exp(x^2)").unwrap(),
        var: "x".to_string(),
        bounds: None,
    };
    let unresolved = evaluate_integral(
        &node,
        &IntegrationLimits::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(unresolved, Expr::Integral(Box::new(node)));
}

#[test]
fn sums_keep_unresolved_terms_as_residual_operators() {
    let result = found("x + exp(x^2)");
    assert!(icas::contains_integral(&result));
}

#[test]
fn cancellation_is_fatal_not_a_miss() {
    let token = CancelToken::new();
    token.cancel();
    let expr = parse_expr("x^2*exp(x^3)").unwrap();
    let result = integrate_expr("x", &expr, &IntegrationLimits::default(), &token);
    assert!(matches!(result, Err(CasError::Cancelled)));
}

#[test]
fn closed_limits_disable_gated_tactics() {
    let limits = IntegrationLimits::from_lookup(|_| None);
    let expr = parse_expr("sin(x)^3").unwrap();
    let outcome = integrate_expr("x", &expr, &limits, &CancelToken::new()).unwrap();
    assert!(matches!(outcome, Outcome::NotFound));
}
