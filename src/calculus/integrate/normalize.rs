//! Integrand canonicalization ahead of tactic matching.

use num_traits::{One, Signed};

use crate::expr::{contains_var, mul, Expr, Func};
use crate::polynomial::Poly;
use crate::simplify::simplify_fully;

use super::common::{flatten_product, rebuild_product};

/// Multiply two or more polynomial factors of a product into a single
/// polynomial factor, so later tactics can match the polynomial part
/// directly. Degrees above `max_degree` are left untouched; the transform
/// trades size for matchability and the bound keeps that trade sane.
pub(crate) fn combine_polynomial_factors(expr: &Expr, var: &str, max_degree: u32) -> Expr {
    let (constant, factors) = flatten_product(expr);
    let mut polys: Vec<Poly> = Vec::new();
    let mut others: Vec<Expr> = Vec::new();
    for factor in &factors {
        match Poly::from_expr(factor, var) {
            Some(poly) if contains_var(factor, var) => polys.push(poly),
            _ => others.push(factor.clone()),
        }
    }
    if polys.len() < 2 {
        return expr.clone();
    }
    let total_degree: usize = polys.iter().filter_map(|p| p.degree()).sum();
    if total_degree > max_degree as usize {
        return expr.clone();
    }
    let product = polys.into_iter().fold(Poly::one(), |acc, p| acc * p);
    others.insert(0, product.to_expr(var));
    simplify_fully(rebuild_product(constant, others))
}

/// Rewrite powers with a constant positive base and variable exponent into
/// the canonical `exp` form, then merge exponential factors by summing their
/// exponents. Several tactics only recognize the `exp` spelling.
pub(crate) fn multiply_out(expr: &Expr, var: &str) -> Expr {
    let rewritten = rewrite_constant_powers(expr, var);
    simplify_fully(merge_exp_factors(&rewritten, var))
}

fn rewrite_constant_powers(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => expr.clone(),
        Expr::Add(a, b) => Expr::Add(
            rewrite_constant_powers(a, var).boxed(),
            rewrite_constant_powers(b, var).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            rewrite_constant_powers(a, var).boxed(),
            rewrite_constant_powers(b, var).boxed(),
        ),
        Expr::Mul(a, b) => Expr::Mul(
            rewrite_constant_powers(a, var).boxed(),
            rewrite_constant_powers(b, var).boxed(),
        ),
        Expr::Div(a, b) => Expr::Div(
            rewrite_constant_powers(a, var).boxed(),
            rewrite_constant_powers(b, var).boxed(),
        ),
        Expr::Pow(base, exp) => {
            let exp = rewrite_constant_powers(exp, var);
            match &**base {
                Expr::Constant(c)
                    if c.is_positive() && !c.is_one() && contains_var(&exp, var) =>
                {
                    Expr::Apply(
                        Func::Exp,
                        mul(exp, Expr::apply(Func::Log, (**base).clone())).boxed(),
                    )
                }
                _ => Expr::Pow(rewrite_constant_powers(base, var).boxed(), exp.boxed()),
            }
        }
        Expr::Neg(inner) => Expr::Neg(rewrite_constant_powers(inner, var).boxed()),
        Expr::Apply(func, arg) => {
            Expr::Apply(*func, rewrite_constant_powers(arg, var).boxed())
        }
        Expr::Integral(_) => expr.clone(),
    }
}

fn merge_exp_factors(expr: &Expr, var: &str) -> Expr {
    let (constant, factors) = flatten_product(expr);
    let mut exponent_sum: Option<Expr> = None;
    let mut exp_count = 0usize;
    let mut others = Vec::new();
    for factor in factors {
        match exp_argument(&factor) {
            Some(arg) if contains_var(&arg, var) => {
                exp_count += 1;
                exponent_sum = Some(match exponent_sum {
                    None => arg,
                    Some(acc) => Expr::Add(acc.boxed(), arg.boxed()),
                });
            }
            _ => others.push(merge_in_children(&factor, var)),
        }
    }
    if exp_count < 2 {
        return expr.clone();
    }
    others.insert(
        0,
        Expr::Apply(Func::Exp, exponent_sum.expect("at least two factors").boxed()),
    );
    rebuild_product(constant, others)
}

fn merge_in_children(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Add(a, b) => Expr::Add(
            merge_exp_factors(a, var).boxed(),
            merge_exp_factors(b, var).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            merge_exp_factors(a, var).boxed(),
            merge_exp_factors(b, var).boxed(),
        ),
        _ => expr.clone(),
    }
}

/// The exponent contributed by an exponential factor, with powers of an
/// exponential folded into a scaled argument.
fn exp_argument(factor: &Expr) -> Option<Expr> {
    match factor {
        Expr::Apply(Func::Exp, arg) => Some((**arg).clone()),
        Expr::Pow(base, exp) => match (&**base, &**exp) {
            (Expr::Apply(Func::Exp, arg), Expr::Constant(k)) => {
                Some(mul(Expr::Constant(k.clone()), (**arg).clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn multiplies_polynomial_factors_together() {
        let expr = parse_expr("(x + 1)*(x - 1)*sin(x)").unwrap();
        let combined = combine_polynomial_factors(&expr, "x", 24);
        let (_, factors) = flatten_product(&combined);
        let polynomial_factors = factors
            .iter()
            .filter(|f| Poly::from_expr(f, "x").is_some())
            .count();
        assert_eq!(polynomial_factors, 1);
    }

    #[test]
    fn respects_the_degree_gate() {
        let expr = parse_expr("(x + 1)*(x - 1)").unwrap();
        assert_eq!(combine_polynomial_factors(&expr, "x", 1), expr);
    }

    #[test]
    fn rewrites_constant_base_powers() {
        let expr = parse_expr("2^x").unwrap();
        let rewritten = multiply_out(&expr, "x");
        assert_eq!(
            rewritten,
            simplify_fully(parse_expr("exp(x*log(2))").unwrap())
        );
    }

    #[test]
    fn merges_adjacent_exponentials() {
        let expr = parse_expr("exp(x)*exp(x^2)").unwrap();
        let merged = multiply_out(&expr, "x");
        assert_eq!(
            merged,
            simplify_fully(parse_expr("exp(x + x^2)").unwrap())
        );
    }
}
