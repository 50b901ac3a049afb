//! Helpers shared by the integration tactics.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::expr::{contains_var, div, mul, variables, Expr, Func, Rational};
use crate::polynomial::{rational_multiple, Poly};
use crate::simplify::{eval, simplify, simplify_fully};

/// Flatten a product into a rational constant and the remaining factors.
/// Division contributes negative-exponent power factors.
pub(crate) fn flatten_product(expr: &Expr) -> (Rational, Vec<Expr>) {
    match expr {
        Expr::Constant(c) => (c.clone(), Vec::new()),
        Expr::Neg(inner) => {
            let (c, factors) = flatten_product(inner);
            (-c, factors)
        }
        Expr::Mul(a, b) => {
            let (ca, mut fa) = flatten_product(a);
            let (cb, mut fb) = flatten_product(b);
            fa.append(&mut fb);
            (ca * cb, fa)
        }
        Expr::Div(a, b) => {
            let (ca, mut fa) = flatten_product(a);
            let (cb, fb) = flatten_product(b);
            for factor in fb {
                fa.push(invert_factor(factor));
            }
            if cb.is_zero() {
                (ca, fa)
            } else {
                (ca / cb, fa)
            }
        }
        other => (Rational::one(), vec![other.clone()]),
    }
}

fn invert_factor(factor: Expr) -> Expr {
    if let Expr::Pow(base, exp) = &factor {
        if let Expr::Constant(k) = &**exp {
            return Expr::Pow(base.clone(), Expr::Constant(-k.clone()).boxed());
        }
    }
    Expr::Pow(factor.boxed(), Expr::integer(-1).boxed())
}

pub(crate) fn rebuild_product(constant: Rational, mut factors: Vec<Expr>) -> Expr {
    if constant.is_zero() {
        return Expr::Constant(Rational::zero());
    }
    let mut terms: Vec<Expr> = Vec::new();
    if !constant.is_one() {
        terms.push(Expr::Constant(constant));
    }
    terms.append(&mut factors);
    terms
        .into_iter()
        .reduce(|a, b| Expr::Mul(a.boxed(), b.boxed()))
        .unwrap_or_else(crate::expr::one)
}

/// Partition a product into its variable-free part (as one expression) and
/// the factors that depend on `var`.
pub(crate) fn split_constant_factors(expr: &Expr, var: &str) -> (Expr, Vec<Expr>) {
    let (constant, factors) = flatten_product(expr);
    let mut free = Vec::new();
    let mut dependent = Vec::new();
    for factor in factors {
        if contains_var(&factor, var) {
            dependent.push(factor);
        } else {
            free.push(factor);
        }
    }
    (rebuild_product(constant, free), dependent)
}

pub(crate) fn apply_constant_factor(constant: Expr, expr: Expr) -> Expr {
    if constant.is_one() {
        expr
    } else {
        simplify(mul(constant, expr))
    }
}

pub(crate) fn log_abs(expr: Expr) -> Expr {
    Expr::apply(Func::Log, Expr::apply(Func::Abs, expr))
}

/// The ratio `expr / target` when it is free of `var`: by direct equality,
/// by symbolic division, by exact polynomial comparison, or as a last resort
/// by consistent numeric sampling that rounds to a small rational.
pub(crate) fn constant_ratio(expr: &Expr, target: &Expr, var: &str) -> Option<Expr> {
    if expr == target {
        return Some(crate::expr::one());
    }
    let quotient = simplify_fully(div(expr.clone(), target.clone()));
    if !contains_var(&quotient, var) {
        return Some(quotient);
    }
    if let Some(ratio) = rational_multiple(expr, target, var) {
        return Some(Expr::Constant(ratio));
    }
    if variables(expr).len() > 1 || variables(target).len() > 1 {
        return None;
    }
    numeric_constant_ratio(expr, target, var).map(Expr::Constant)
}

fn numeric_constant_ratio(expr: &Expr, target: &Expr, var: &str) -> Option<Rational> {
    let samples = [-2.5, -1.0, -0.5, 0.5, 1.0, 2.0, 3.25];
    let mut ratio: Option<f64> = None;
    let mut seen = 0;
    for sample in samples {
        let mut env = BTreeMap::new();
        env.insert(var.to_string(), sample);
        let Some(t_val) = eval(target, &env) else {
            continue;
        };
        if t_val.abs() < 1e-9 {
            continue;
        }
        let e_val = eval(expr, &env)?;
        let r = e_val / t_val;
        if let Some(previous) = ratio {
            if (r - previous).abs() > 1e-6 {
                return None;
            }
        } else {
            ratio = Some(r);
        }
        seen += 1;
    }
    if seen < 3 {
        return None;
    }
    ratio.and_then(approximate_rational)
}

fn approximate_rational(value: f64) -> Option<Rational> {
    if !value.is_finite() {
        return None;
    }
    for den in 1..=512i64 {
        let num = (value * den as f64).round();
        let approx = Rational::new(BigInt::from(num as i64), BigInt::from(den));
        if (approx.to_f64()? - value).abs() < 1e-9 {
            return Some(approx);
        }
    }
    None
}

/// Coefficients `(a, b)` of a degree-one polynomial `a*var + b`, requiring
/// `a != 0`.
pub(crate) fn linear_parts(expr: &Expr, var: &str) -> Option<(Rational, Rational)> {
    let poly = Poly::from_expr(expr, var)?;
    if poly.degree()? != 1 {
        return None;
    }
    Some((poly.coeff(1), poly.coeff(0)))
}

pub(crate) fn is_polynomial(expr: &Expr, var: &str) -> bool {
    Poly::from_expr(expr, var).is_some()
}

pub(crate) fn polynomial_degree(expr: &Expr, var: &str) -> Option<usize> {
    Poly::from_expr(expr, var).and_then(|p| p.degree())
}

pub(crate) fn as_integer(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Constant(c) if c.is_integer() => c.to_integer().to_i64(),
        Expr::Neg(inner) => as_integer(inner).map(|v| -v),
        _ => None,
    }
}

/// A variable name not occurring in any of the given expressions.
pub(crate) fn fresh_var(base: &str, exprs: &[&Expr]) -> String {
    let taken: std::collections::BTreeSet<String> = exprs
        .iter()
        .flat_map(|expr| variables(expr))
        .collect();
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut index = 0usize;
    loop {
        let candidate = format!("{base}{index}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn splits_variable_free_factors() {
        let expr = parse_expr("3*y*sin(x)*x").unwrap();
        let (free, dependent) = split_constant_factors(&expr, "x");
        assert_eq!(simplify_fully(free), simplify_fully(parse_expr("3*y").unwrap()));
        assert_eq!(dependent.len(), 2);
    }

    #[test]
    fn finds_symbolic_constant_ratio() {
        let expr = parse_expr("6*x^2").unwrap();
        let target = parse_expr("3*x^2").unwrap();
        assert_eq!(
            constant_ratio(&expr, &target, "x"),
            Some(Expr::integer(2))
        );
    }

    #[test]
    fn rejects_variable_ratios() {
        let expr = parse_expr("x^3").unwrap();
        let target = parse_expr("x").unwrap();
        assert!(constant_ratio(&expr, &target, "x").is_none());
    }

    #[test]
    fn extracts_linear_parts() {
        let expr = parse_expr("2*x + 3").unwrap();
        assert_eq!(
            linear_parts(&expr, "x"),
            Some((
                Rational::from_integer(2.into()),
                Rational::from_integer(3.into())
            ))
        );
        assert!(linear_parts(&parse_expr("x^2").unwrap(), "x").is_none());
    }

    #[test]
    fn fresh_variable_avoids_collisions() {
        let expr = parse_expr("u + u0").unwrap();
        assert_eq!(fresh_var("u", &[&expr]), "u1");
    }
}
