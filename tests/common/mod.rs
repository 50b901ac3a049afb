#![allow(dead_code)]

use icas::{
    differentiate, equivalent, integrate_expr, parse_expr, CancelToken, Expr, IntegrationLimits,
    Outcome,
};

pub fn integrate_str(input: &str) -> Outcome {
    let expr = parse_expr(input).expect("parse integrand");
    integrate_expr(
        "x",
        &expr,
        &IntegrationLimits::default(),
        &CancelToken::new(),
    )
    .expect("integration should not fail")
}

pub fn found(input: &str) -> Expr {
    match integrate_str(input) {
        Outcome::Found(result) => result,
        Outcome::NotFound => panic!("expected a closed form for {input}"),
    }
}

/// The standing oracle: whatever the engine claims as an antiderivative must
/// differentiate back to the integrand.
pub fn assert_antiderivative(input: &str) {
    let result = found(input);
    let derived = differentiate("x", &result);
    let original = parse_expr(input).unwrap();
    assert!(
        equivalent(&derived, &original),
        "differentiation round trip failed for {input}: got {result}, derivative {derived}"
    );
}
