//! Differential-field machinery for exponential and logarithmic extensions,
//! plus the tower-substitution tactic built on top of it.

mod tower;

pub use tower::{GenKind, Generator, Membership, Tower};

use crate::error::Result;
use crate::expr::{contains_integral, div, mul, Expr, Func};
use crate::simplify::{express_in_terms_of, simplify, simplify_fully, substitute};

use super::integrate::common::{fresh_var, linear_parts};
use super::integrate::{dispatch, Context, Outcome};

/// Integrate an integrand that is rational in a single exponential
/// generator: substitute `t = exp(g)`, divide by `g'·t`, and re-enter the
/// dispatcher on the transformed integral.
pub(crate) fn exponential_tower(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    if !has_variable_exp(expr, &ctx.var) {
        return Ok(Outcome::NotFound);
    }
    let mut tower = Tower::new(ctx.var.clone());
    tower.grow_for(expr)?;
    let [generator] = tower.generators() else {
        return Ok(Outcome::NotFound);
    };
    if generator.kind != GenKind::Exp {
        return Ok(Outcome::NotFound);
    }
    let Some((slope, _)) = linear_parts(&generator.arg, &ctx.var) else {
        return Ok(Outcome::NotFound);
    };
    let u = generator.expr();
    let scaled = simplify_fully(div(
        expr.clone(),
        mul(Expr::Constant(slope), u.clone()),
    ));
    let t_name = fresh_var("t", &[expr, &u]);
    let Ok(in_t) = express_in_terms_of(&scaled, &u, &t_name, &ctx.var) else {
        return Ok(Outcome::NotFound);
    };
    let sub_ctx = ctx.with_var(t_name.clone());
    if let Outcome::Found(result) = dispatch(&sub_ctx, &in_t)? {
        if !contains_integral(&result) {
            let back = substitute(&result, &t_name, &u);
            return Ok(Outcome::Found(simplify(back)));
        }
    }
    Ok(Outcome::NotFound)
}

fn has_variable_exp(expr: &Expr, var: &str) -> bool {
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => false,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            has_variable_exp(a, var) || has_variable_exp(b, var)
        }
        Expr::Neg(inner) => has_variable_exp(inner, var),
        Expr::Apply(Func::Exp, arg) => crate::expr::contains_var(arg, var),
        Expr::Apply(_, arg) => has_variable_exp(arg, var),
        Expr::Integral(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::integrate::{integrate_expr, CancelToken, IntegrationLimits, Outcome};
    use crate::calculus::differentiate;
    use crate::parser::parse_expr;
    use crate::simplify::equivalent;

    #[test]
    fn rational_in_one_exponential_round_trips() {
        for input in [
            "exp(x)/(1 + exp(x))",
            "exp(2*x)/(1 + exp(x))^2",
            "exp(x/2)*(1 + exp(x))",
        ] {
            let expr = parse_expr(input).unwrap();
            let outcome = integrate_expr(
                "x",
                &expr,
                &IntegrationLimits::default(),
                &CancelToken::new(),
            )
            .unwrap();
            let Outcome::Found(result) = outcome else {
                panic!("expected a closed form for {input}");
            };
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &expr),
                "round trip failed for {input}"
            );
        }
    }
}
