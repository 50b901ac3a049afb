use crate::expr::{contains_var, Expr, Func, Rational};
use crate::polynomial::rational_multiple;
use crate::simplify::simplify_fully;
use num_traits::{One, ToPrimitive, Zero};

/// Returned when an expression cannot be rewritten purely in terms of the
/// requested substitution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotSubstitutable;

/// Substitute variable `var` with `replacement` throughout `expr`. A definite
/// or indefinite integral in `var` binds it, so only the parts where `var` is
/// free are touched.
pub fn substitute(expr: &Expr, var: &str, replacement: &Expr) -> Expr {
    match expr {
        Expr::Variable(name) if name == var => replacement.clone(),
        Expr::Variable(_) | Expr::Constant(_) => expr.clone(),
        Expr::Add(a, b) => Expr::Add(
            substitute(a, var, replacement).boxed(),
            substitute(b, var, replacement).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            substitute(a, var, replacement).boxed(),
            substitute(b, var, replacement).boxed(),
        ),
        Expr::Mul(a, b) => Expr::Mul(
            substitute(a, var, replacement).boxed(),
            substitute(b, var, replacement).boxed(),
        ),
        Expr::Div(a, b) => Expr::Div(
            substitute(a, var, replacement).boxed(),
            substitute(b, var, replacement).boxed(),
        ),
        Expr::Pow(a, b) => Expr::Pow(
            substitute(a, var, replacement).boxed(),
            substitute(b, var, replacement).boxed(),
        ),
        Expr::Neg(a) => Expr::Neg(substitute(a, var, replacement).boxed()),
        Expr::Apply(func, a) => Expr::Apply(*func, substitute(a, var, replacement).boxed()),
        Expr::Integral(node) => {
            let mut node = (**node).clone();
            node.bounds = node
                .bounds
                .map(|(lo, hi)| (substitute(&lo, var, replacement), substitute(&hi, var, replacement)));
            if node.var != var {
                node.integrand = substitute(&node.integrand, var, replacement);
            }
            Expr::Integral(Box::new(node))
        }
    }
}

/// Replace every structural occurrence of `target` in `expr` with
/// `replacement`.
pub fn replace_subexpr(expr: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    if expr == target {
        return replacement.clone();
    }
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => expr.clone(),
        Expr::Add(a, b) => Expr::Add(
            replace_subexpr(a, target, replacement).boxed(),
            replace_subexpr(b, target, replacement).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            replace_subexpr(a, target, replacement).boxed(),
            replace_subexpr(b, target, replacement).boxed(),
        ),
        Expr::Mul(a, b) => Expr::Mul(
            replace_subexpr(a, target, replacement).boxed(),
            replace_subexpr(b, target, replacement).boxed(),
        ),
        Expr::Div(a, b) => Expr::Div(
            replace_subexpr(a, target, replacement).boxed(),
            replace_subexpr(b, target, replacement).boxed(),
        ),
        Expr::Pow(a, b) => Expr::Pow(
            replace_subexpr(a, target, replacement).boxed(),
            replace_subexpr(b, target, replacement).boxed(),
        ),
        Expr::Neg(a) => Expr::Neg(replace_subexpr(a, target, replacement).boxed()),
        Expr::Apply(func, a) => {
            Expr::Apply(*func, replace_subexpr(a, target, replacement).boxed())
        }
        Expr::Integral(node) => {
            let mut node = (**node).clone();
            node.integrand = replace_subexpr(&node.integrand, target, replacement);
            node.bounds = node.bounds.map(|(lo, hi)| {
                (
                    replace_subexpr(&lo, target, replacement),
                    replace_subexpr(&hi, target, replacement),
                )
            });
            Expr::Integral(Box::new(node))
        }
    }
}

/// Rewrite `expr` purely in terms of the substitution target `u`, renamed to
/// the fresh variable `u_name`. Tries a structural rewrite first (occurrences
/// of `u`, and integer exponential multiples when `u` is an exponential),
/// then falls back to inverting `u` and substituting `var` away entirely.
pub fn express_in_terms_of(
    expr: &Expr,
    u: &Expr,
    u_name: &str,
    var: &str,
) -> Result<Expr, NotSubstitutable> {
    let u_var = Expr::var(u_name);
    let structural = simplify_fully(replace_with_exp_powers(expr, u, &u_var, var));
    if !contains_var(&structural, var) {
        return Ok(structural);
    }
    let inverse = solve_for(u, var, u_var).ok_or(NotSubstitutable)?;
    let substituted = simplify_fully(substitute(expr, var, &inverse));
    if contains_var(&substituted, var) {
        return Err(NotSubstitutable);
    }
    Ok(substituted)
}

fn replace_with_exp_powers(expr: &Expr, u: &Expr, u_var: &Expr, var: &str) -> Expr {
    let replaced = replace_subexpr(expr, u, u_var);
    let Expr::Apply(Func::Exp, u_arg) = u else {
        return replaced;
    };
    map_exp_multiples(&replaced, u_arg, u_var, var)
}

fn map_exp_multiples(expr: &Expr, u_arg: &Expr, u_var: &Expr, var: &str) -> Expr {
    if let Expr::Apply(Func::Exp, h) = expr {
        if let Some(ratio) = rational_multiple(h, u_arg, var) {
            if ratio.is_integer() && !ratio.is_zero() {
                let k = ratio.to_integer().to_i64();
                if let Some(k) = k {
                    return Expr::Pow(u_var.clone().boxed(), Expr::integer(k).boxed());
                }
            }
        }
    }
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => expr.clone(),
        Expr::Add(a, b) => Expr::Add(
            map_exp_multiples(a, u_arg, u_var, var).boxed(),
            map_exp_multiples(b, u_arg, u_var, var).boxed(),
        ),
        Expr::Sub(a, b) => Expr::Sub(
            map_exp_multiples(a, u_arg, u_var, var).boxed(),
            map_exp_multiples(b, u_arg, u_var, var).boxed(),
        ),
        Expr::Mul(a, b) => Expr::Mul(
            map_exp_multiples(a, u_arg, u_var, var).boxed(),
            map_exp_multiples(b, u_arg, u_var, var).boxed(),
        ),
        Expr::Div(a, b) => Expr::Div(
            map_exp_multiples(a, u_arg, u_var, var).boxed(),
            map_exp_multiples(b, u_arg, u_var, var).boxed(),
        ),
        Expr::Pow(a, b) => Expr::Pow(
            map_exp_multiples(a, u_arg, u_var, var).boxed(),
            map_exp_multiples(b, u_arg, u_var, var).boxed(),
        ),
        Expr::Neg(a) => Expr::Neg(map_exp_multiples(a, u_arg, u_var, var).boxed()),
        Expr::Apply(func, a) => {
            Expr::Apply(*func, map_exp_multiples(a, u_arg, u_var, var).boxed())
        }
        Expr::Integral(_) => expr.clone(),
    }
}

/// Solve `u(var) = rhs` for `var` by peeling invertible layers.
fn solve_for(u: &Expr, var: &str, rhs: Expr) -> Option<Expr> {
    match u {
        Expr::Variable(name) if name == var => Some(rhs),
        Expr::Add(a, b) => {
            if !contains_var(b, var) {
                solve_for(a, var, Expr::Sub(rhs.boxed(), b.clone()))
            } else if !contains_var(a, var) {
                solve_for(b, var, Expr::Sub(rhs.boxed(), a.clone()))
            } else {
                None
            }
        }
        Expr::Sub(a, b) => {
            if !contains_var(b, var) {
                solve_for(a, var, Expr::Add(rhs.boxed(), b.clone()))
            } else if !contains_var(a, var) {
                solve_for(b, var, Expr::Sub(a.clone(), rhs.boxed()))
            } else {
                None
            }
        }
        Expr::Mul(a, b) => {
            if !contains_var(b, var) && !b.is_zero() {
                solve_for(a, var, Expr::Div(rhs.boxed(), b.clone()))
            } else if !contains_var(a, var) && !a.is_zero() {
                solve_for(b, var, Expr::Div(rhs.boxed(), a.clone()))
            } else {
                None
            }
        }
        Expr::Div(a, b) => {
            if !contains_var(b, var) {
                solve_for(a, var, Expr::Mul(rhs.boxed(), b.clone()))
            } else if !contains_var(a, var) {
                solve_for(b, var, Expr::Div(a.clone(), rhs.boxed()))
            } else {
                None
            }
        }
        Expr::Neg(inner) => solve_for(inner, var, Expr::Neg(rhs.boxed())),
        Expr::Pow(base, exp) => match &**exp {
            Expr::Constant(k) if !k.is_zero() => {
                let inverse_exp = Expr::Constant(Rational::one() / k);
                solve_for(base, var, Expr::Pow(rhs.boxed(), inverse_exp.boxed()))
            }
            _ => None,
        },
        Expr::Apply(Func::Exp, inner) => {
            solve_for(inner, var, Expr::Apply(Func::Log, rhs.boxed()))
        }
        Expr::Apply(Func::Log, inner) => {
            solve_for(inner, var, Expr::Apply(Func::Exp, rhs.boxed()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::simplify::simplify_fully;

    #[test]
    fn substitutes_variables() {
        let expr = parse_expr("x^2 + y").unwrap();
        let replaced = substitute(&expr, "x", &parse_expr("z + 1").unwrap());
        assert_eq!(replaced, parse_expr("(z + 1)^2 + y").unwrap());
    }

    #[test]
    fn structural_rewrite_finds_subterm() {
        let expr = parse_expr("sin(x)^2").unwrap();
        let u = parse_expr("sin(x)").unwrap();
        let rewritten = express_in_terms_of(&expr, &u, "u", "x").unwrap();
        assert_eq!(rewritten, simplify_fully(parse_expr("u^2").unwrap()));
    }

    #[test]
    fn inverse_rewrite_handles_shifted_exponentials() {
        // exp(x)/(1 + exp(x))^2 with u = 1 + exp(x) becomes (u - 1)/u^2.
        let expr = parse_expr("exp(x)/(1 + exp(x))^2").unwrap();
        let u = parse_expr("1 + exp(x)").unwrap();
        let rewritten = express_in_terms_of(&expr, &u, "u", "x").unwrap();
        assert_eq!(
            rewritten,
            simplify_fully(parse_expr("(u - 1)/u^2").unwrap())
        );
    }

    #[test]
    fn exponential_powers_map_to_integer_powers() {
        let expr = parse_expr("exp(2*x)").unwrap();
        let u = parse_expr("exp(x)").unwrap();
        let rewritten = express_in_terms_of(&expr, &u, "u", "x").unwrap();
        assert_eq!(rewritten, simplify_fully(parse_expr("u^2").unwrap()));
    }

    #[test]
    fn reports_unexpressible_inputs() {
        let expr = parse_expr("x*sin(x)").unwrap();
        let u = parse_expr("sin(x)").unwrap();
        assert!(express_in_terms_of(&expr, &u, "u", "x").is_err());
    }
}
