mod common;

use common::{assert_antiderivative, found};
use icas::{equivalent, parse_expr};

#[test]
fn logarithm_integrates_by_the_table() {
    let result = found("log(x)");
    assert!(equivalent(
        &result,
        &parse_expr("x*log(x) - x").unwrap()
    ));
}

#[test]
fn cotangent_integrates_to_a_logarithm() {
    let result = found("cot(x)");
    assert!(equivalent(
        &result,
        &parse_expr("log(abs(sin(x)))").unwrap()
    ));
}

#[test]
fn every_table_function_round_trips() {
    for input in [
        "sin(x)", "cos(x)", "tan(x)", "cot(x)", "sec(x)", "csc(x)", "asin(x)", "acos(x)",
        "atan(x)", "acot(x)", "sinh(x)", "cosh(x)", "tanh(x)", "asinh(x)", "acosh(x)",
        "atanh(x)", "exp(x)", "log(x)", "abs(x)",
    ] {
        assert_antiderivative(input);
    }
}

#[test]
fn affine_arguments_integrate_through_substitution() {
    assert_antiderivative("sin(2*x + 3)");
    assert_antiderivative("exp(2*x + 1)");
    assert_antiderivative("log(2*x + 3)");
}

#[test]
fn base_ten_logarithm_is_a_scaled_natural_logarithm() {
    assert_antiderivative("lg(x)");
}
