//! Definite-integral evaluation: bound substitution distributed structurally
//! over the antiderivative, with residual unresolved integrals rewritten
//! into their own definite form.

use crate::error::{CasError, Result};
use crate::expr::{contains_var, sub, Expr, IntegralNode};
use crate::simplify::{simplify_fully, substitute};

use super::{dispatch, CancelToken, Context, IntegrationLimits, Outcome};

pub(crate) fn evaluate(
    node: &IntegralNode,
    limits: &IntegrationLimits,
    cancel: &CancelToken,
) -> Result<Outcome> {
    let Some((lower, upper)) = &node.bounds else {
        return Err(CasError::Inconsistent(
            "definite evaluation on an indefinite integral".to_string(),
        ));
    };
    let lower = simplify_fully(lower.clone());
    let upper = simplify_fully(upper.clone());
    if lower == upper {
        return Ok(Outcome::Found(crate::expr::zero()));
    }
    let ctx = Context::new(node.var.clone(), limits, cancel);
    let Outcome::Found(antiderivative) = dispatch(&ctx, &node.integrand)? else {
        return Ok(Outcome::NotFound);
    };
    let value = bound_difference(&antiderivative, &node.var, &lower, &upper)?;
    Ok(Outcome::Found(simplify_fully(value)))
}

/// `F(upper) - F(lower)` by structural recursion over the antiderivative.
/// Sums distribute. Any other shape is substituted directly when it carries
/// no residual integral; a variable-free coefficient times exactly one
/// residual integral (not under a denominator) turns that residual into its
/// own definite integral. Every remaining combination means the engine
/// produced a malformed antiderivative, which is an internal-consistency
/// error rather than a silent zero.
fn bound_difference(expr: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr> {
    match expr {
        Expr::Add(a, b) => Ok(Expr::Add(
            bound_difference(a, var, lower, upper)?.boxed(),
            bound_difference(b, var, lower, upper)?.boxed(),
        )),
        Expr::Sub(a, b) => Ok(Expr::Sub(
            bound_difference(a, var, lower, upper)?.boxed(),
            bound_difference(b, var, lower, upper)?.boxed(),
        )),
        Expr::Neg(inner) => Ok(bound_difference(inner, var, lower, upper)?.negate()),
        Expr::Integral(node) if node.bounds.is_none() && node.var == var => {
            Ok(Expr::definite_integral(
                node.integrand.clone(),
                node.var.clone(),
                lower.clone(),
                upper.clone(),
            ))
        }
        other => {
            let residuals = count_residual_integrals(other, var);
            if residuals == 0 {
                return Ok(sub(
                    substitute(other, var, upper),
                    substitute(other, var, lower),
                ));
            }
            let free_outside = !contains_var_outside_residuals(other, var);
            if residuals == 1 && free_outside && !residual_in_denominator(other, var, false) {
                return Ok(rewrite_single_residual(other, var, lower, upper));
            }
            Err(CasError::Inconsistent(format!(
                "antiderivative mixes the variable with {residuals} residual integral(s): {other}"
            )))
        }
    }
}

fn count_residual_integrals(expr: &Expr, var: &str) -> usize {
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => 0,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            count_residual_integrals(a, var) + count_residual_integrals(b, var)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => count_residual_integrals(inner, var),
        Expr::Integral(node) => {
            if node.bounds.is_none() && node.var == var {
                1
            } else {
                0
            }
        }
    }
}

fn contains_var_outside_residuals(expr: &Expr, var: &str) -> bool {
    match expr {
        Expr::Variable(name) => name == var,
        Expr::Constant(_) => false,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            contains_var_outside_residuals(a, var) || contains_var_outside_residuals(b, var)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => contains_var_outside_residuals(inner, var),
        Expr::Integral(node) => {
            if node.bounds.is_none() && node.var == var {
                false
            } else {
                contains_var(expr, var)
            }
        }
    }
}

fn residual_in_denominator(expr: &Expr, var: &str, in_denominator: bool) -> bool {
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => false,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            residual_in_denominator(a, var, in_denominator)
                || residual_in_denominator(b, var, in_denominator)
        }
        Expr::Div(numer, denom) => {
            residual_in_denominator(numer, var, in_denominator)
                || residual_in_denominator(denom, var, true)
        }
        Expr::Pow(base, exp) => {
            let negative = matches!(
                super::common::as_integer(exp), Some(k) if k < 0
            );
            residual_in_denominator(base, var, in_denominator || negative)
                || residual_in_denominator(exp, var, in_denominator)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => {
            residual_in_denominator(inner, var, in_denominator)
        }
        Expr::Integral(node) => in_denominator && node.bounds.is_none() && node.var == var,
    }
}

fn rewrite_single_residual(expr: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Expr {
    match expr {
        Expr::Integral(node) if node.bounds.is_none() && node.var == var => {
            Expr::definite_integral(
                node.integrand.clone(),
                node.var.clone(),
                lower.clone(),
                upper.clone(),
            )
        }
        Expr::Add(a, b) => Expr::Add(
            rewrite_single_residual(a, var, lower, upper).boxed(),
            rewrite_single_residual(b, var, lower, upper).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            rewrite_single_residual(a, var, lower, upper).boxed(),
            rewrite_single_residual(b, var, lower, upper).boxed(),
        ),
        Expr::Mul(a, b) => Expr::Mul(
            rewrite_single_residual(a, var, lower, upper).boxed(),
            rewrite_single_residual(b, var, lower, upper).boxed(),
        ),
        Expr::Div(a, b) => Expr::Div(
            rewrite_single_residual(a, var, lower, upper).boxed(),
            rewrite_single_residual(b, var, lower, upper).boxed(),
        ),
        Expr::Pow(a, b) => Expr::Pow(
            rewrite_single_residual(a, var, lower, upper).boxed(),
            rewrite_single_residual(b, var, lower, upper).boxed(),
        ),
        Expr::Neg(inner) => Expr::Neg(rewrite_single_residual(inner, var, lower, upper).boxed()),
        Expr::Apply(func, inner) => {
            Expr::Apply(*func, rewrite_single_residual(inner, var, lower, upper).boxed())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_mixtures_raise_inconsistency() {
        // x times an unresolved integral cannot be bound-substituted.
        let residual = Expr::indefinite_integral(
            Expr::apply(crate::expr::Func::Exp, Expr::var("x")),
            "x",
        );
        let malformed = crate::expr::mul(Expr::var("x"), residual);
        let result = bound_difference(
            &malformed,
            "x",
            &Expr::integer(0),
            &Expr::integer(1),
        );
        assert!(matches!(result, Err(CasError::Inconsistent(_))));
    }

    #[test]
    fn twin_residuals_raise_inconsistency() {
        let residual = Expr::indefinite_integral(
            Expr::apply(crate::expr::Func::Exp, Expr::var("x")),
            "x",
        );
        let doubled = crate::expr::mul(residual.clone(), residual);
        let result = bound_difference(
            &doubled,
            "x",
            &Expr::integer(0),
            &Expr::integer(1),
        );
        assert!(matches!(result, Err(CasError::Inconsistent(_))));
    }

    #[test]
    fn coefficient_times_residual_becomes_definite() {
        let residual = Expr::indefinite_integral(
            Expr::apply(crate::expr::Func::Exp, Expr::var("x")),
            "x",
        );
        let scaled = crate::expr::mul(Expr::integer(3), residual);
        let result =
            bound_difference(&scaled, "x", &Expr::integer(0), &Expr::integer(1)).unwrap();
        let expected = crate::expr::mul(
            Expr::integer(3),
            Expr::definite_integral(
                Expr::apply(crate::expr::Func::Exp, Expr::var("x")),
                "x",
                Expr::integer(0),
                Expr::integer(1),
            ),
        );
        assert_eq!(result, expected);
    }
}
