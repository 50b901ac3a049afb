//! The u-substitution search and the logarithmic-derivative shortcut.

use crate::calculus::differentiate;
use crate::error::Result;
use crate::expr::{contains_integral, contains_var, div, Expr};
use crate::simplify::{express_in_terms_of, simplify, simplify_fully, substitute};

use super::common::{constant_ratio, fresh_var, log_abs};
use super::terms::ProductSplit;
use super::{dispatch, Context, Outcome};

/// `c * g'/g` integrates to `c * log|g|`. Each denominator factor is tried as
/// `g` in turn by removing it from its slot and comparing the rest of the
/// integrand against `g'`.
pub(crate) fn log_derivative(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let mut split = ProductSplit::of(expr);
    for index in 0..split.denom.bound() {
        ctx.cancel.check()?;
        let Some(g) = split.denom.take(index) else {
            continue;
        };
        if !contains_var(&g, &ctx.var) {
            split.denom.put(index, g);
            continue;
        }
        let derivative = simplify_fully(differentiate(&ctx.var, &g));
        if !derivative.is_zero() {
            let remaining = split.combine();
            if let Some(coefficient) = constant_ratio(&remaining, &derivative, &ctx.var) {
                return Ok(Outcome::Found(simplify(Expr::Mul(
                    coefficient.boxed(),
                    log_abs(g).boxed(),
                ))));
            }
        }
        split.denom.put(index, g);
    }
    Ok(Outcome::NotFound)
}

/// Standard substitution search: propose candidate inner expressions per
/// factor, divide the integrand by the candidate's derivative, rewrite in
/// terms of the new variable, and re-enter the dispatcher on the transformed
/// integral. The first candidate that leads to a fully resolved
/// sub-integral wins.
pub(crate) fn search(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let split = ProductSplit::of(expr);
    let sides = [&split.numer, &split.denom];
    for side in sides {
        for (_, factor) in side.iter() {
            for u in candidates(factor, &ctx.var) {
                ctx.cancel.check()?;
                if u.as_variable() == Some(ctx.var.as_str()) || !contains_var(&u, &ctx.var) {
                    continue;
                }
                let derivative = simplify_fully(differentiate(&ctx.var, &u));
                if derivative.is_zero() {
                    continue;
                }
                let scaled = simplify_fully(div(expr.clone(), derivative));
                let u_name = fresh_var("u", &[expr, &u]);
                // A not-substitutable report just moves on to the next
                // candidate.
                let Ok(in_u) = express_in_terms_of(&scaled, &u, &u_name, &ctx.var) else {
                    continue;
                };
                let sub_ctx = ctx.with_var(u_name.clone());
                if let Outcome::Found(result) = dispatch(&sub_ctx, &in_u)? {
                    if !contains_integral(&result) {
                        let back = substitute(&result, &u_name, &u);
                        return Ok(Outcome::Found(simplify(back)));
                    }
                }
            }
        }
    }
    Ok(Outcome::NotFound)
}

/// Candidate inner expressions for one factor: the exponent of a power with
/// variable-free base, the base of a power with variable-free exponent (when
/// the base is more than the bare variable) together with candidates inside
/// it, or a function application together with its argument and candidates
/// inside the argument. Generation order is preserved; duplicates are
/// dropped.
fn candidates(factor: &Expr, var: &str) -> Vec<Expr> {
    let mut found = collect_candidates(factor, var);
    let mut seen: Vec<Expr> = Vec::new();
    found.retain(|candidate| {
        if seen.contains(candidate) {
            false
        } else {
            seen.push(candidate.clone());
            true
        }
    });
    found
}

fn collect_candidates(factor: &Expr, var: &str) -> Vec<Expr> {
    match factor {
        Expr::Pow(base, exp) => {
            if !contains_var(base, var) && contains_var(exp, var) {
                vec![(**exp).clone()]
            } else if !contains_var(exp, var) && base.as_variable() != Some(var) {
                let mut found = vec![(**base).clone()];
                found.extend(collect_candidates(base, var));
                found
            } else {
                Vec::new()
            }
        }
        Expr::Apply(_, arg) => {
            let mut found = vec![factor.clone()];
            if arg.as_variable() != Some(var) {
                found.push((**arg).clone());
            }
            found.extend(collect_candidates(arg, var));
            found
        }
        Expr::Neg(inner) => collect_candidates(inner, var),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Func;
    use crate::parser::parse_expr;

    #[test]
    fn proposes_function_applications_and_inner_candidates() {
        let factor = parse_expr("exp(x^3)").unwrap();
        let found = candidates(&factor, "x");
        assert_eq!(
            found,
            vec![
                parse_expr("exp(x^3)").unwrap(),
                parse_expr("x^3").unwrap()
            ]
        );

        let factor = parse_expr("sin(log(x))").unwrap();
        let found = candidates(&factor, "x");
        assert_eq!(
            found,
            vec![
                parse_expr("sin(log(x))").unwrap(),
                parse_expr("log(x)").unwrap()
            ]
        );
    }

    #[test]
    fn proposes_power_bases_when_exponent_is_constant() {
        let factor = parse_expr("(x^2 + 1)^5").unwrap();
        let found = candidates(&factor, "x");
        assert_eq!(found, vec![parse_expr("x^2 + 1").unwrap()]);
    }

    #[test]
    fn proposes_exponents_over_constant_bases() {
        let factor = Expr::Pow(
            Expr::integer(2).boxed(),
            parse_expr("x^2").unwrap().boxed(),
        );
        let found = candidates(&factor, "x");
        assert_eq!(found, vec![parse_expr("x^2").unwrap()]);
    }

    #[test]
    fn bare_variable_is_never_a_candidate() {
        let factor = Expr::apply(Func::Sin, Expr::var("x"));
        let found = candidates(&factor, "x");
        assert_eq!(found[0], factor);
        assert!(!found.contains(&Expr::var("x")));
    }
}
