use icas::{
    equivalent, integrate, parse_expr, simplify_fully, sub, CancelToken, Expr, IntegralNode,
    IntegrationLimits, Outcome,
};

fn definite(input: &str, lower: i64, upper: i64) -> Outcome {
    let node = IntegralNode {
        integrand: parse_expr(input).unwrap(),
        var: "x".to_string(),
        bounds: Some((Expr::integer(lower), Expr::integer(upper))),
    };
    integrate(&node, &IntegrationLimits::default(), &CancelToken::new()).unwrap()
}

fn definite_value(input: &str, lower: i64, upper: i64) -> Expr {
    match definite(input, lower, upper) {
        Outcome::Found(result) => result,
        Outcome::NotFound => panic!("expected a definite value for {input}"),
    }
}

#[test]
fn evaluates_polynomial_bounds() {
    let value = definite_value("x^2", 0, 3);
    assert_eq!(simplify_fully(value), Expr::integer(9));
}

#[test]
fn zero_width_bounds_give_zero_without_any_work() {
    // Even an unintegrable integrand evaluates to zero over [a, a].
    let value = definite_value("exp(x^2)", 2, 2);
    assert!(value.is_zero());
}

#[test]
fn adjacent_intervals_add_up() {
    // ∫[0,1] + ∫[1,2] agrees with ∫[0,2].
    let first = definite_value("x^3 - x", 0, 1);
    let second = definite_value("x^3 - x", 1, 2);
    let whole = definite_value("x^3 - x", 0, 2);
    let summed = Expr::Add(first.boxed(), second.boxed());
    assert!(equivalent(&summed, &whole));
}

#[test]
fn unresolvable_integrands_stay_unevaluated() {
    assert!(matches!(definite("exp(x^2)", 0, 1), Outcome::NotFound));
}

#[test]
fn residual_terms_become_definite_integrals() {
    // The x part evaluates; the unresolved part is re-wrapped with the same
    // bounds.
    let value = definite_value("x + exp(x^2)", 0, 1);
    let residual = Expr::definite_integral(
        parse_expr("exp(x^2)").unwrap(),
        "x",
        Expr::integer(0),
        Expr::integer(1),
    );
    let expected = Expr::Add(Expr::constant(1, 2).boxed(), residual.boxed());
    assert!(simplify_fully(sub(value, expected)).is_zero());
}

#[test]
fn variable_bounds_evaluate_symbolically() {
    let node = IntegralNode {
        integrand: parse_expr("t").unwrap(),
        var: "t".to_string(),
        bounds: Some((Expr::integer(0), Expr::var("x"))),
    };
    let outcome =
        integrate(&node, &IntegrationLimits::default(), &CancelToken::new()).unwrap();
    let Outcome::Found(value) = outcome else {
        panic!("expected symbolic bound evaluation");
    };
    assert!(equivalent(&value, &parse_expr("x^2/2").unwrap()));
}
