//! Closed-form antiderivatives for elementary functions applied directly to
//! the integration variable, plus the monomial shortcut.

use num_traits::One;

use crate::error::Result;
use crate::expr::{div, mul, one, sqrt, sub, Expr, Func, Rational};

use super::common::{as_integer, log_abs};
use super::{Context, Outcome};

/// `c * x^r` for rational `r`, including `r = -1`.
pub(crate) fn monomial(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let x = Expr::var(&ctx.var);
    match expr {
        Expr::Variable(name) if *name == ctx.var => Ok(Outcome::Found(div(
            Expr::Pow(x.boxed(), Expr::integer(2).boxed()),
            Expr::integer(2),
        ))),
        Expr::Pow(base, exp) => {
            if base.as_variable() != Some(ctx.var.as_str()) {
                return Ok(Outcome::NotFound);
            }
            let exponent = match (&**exp, as_integer(exp)) {
                (Expr::Constant(k), _) => k.clone(),
                (_, Some(k)) => Rational::from_integer(k.into()),
                _ => return Ok(Outcome::NotFound),
            };
            if exponent == -Rational::one() {
                return Ok(Outcome::Found(log_abs(x)));
            }
            let raised = exponent + Rational::one();
            Ok(Outcome::Found(div(
                Expr::Pow(x.boxed(), Expr::Constant(raised.clone()).boxed()),
                Expr::Constant(raised),
            )))
        }
        _ => Ok(Outcome::NotFound),
    }
}

/// Table lookup for a single function application `f(x)`.
pub(crate) fn elementary(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let Expr::Apply(func, arg) = expr else {
        return Ok(Outcome::NotFound);
    };
    if arg.as_variable() != Some(ctx.var.as_str()) {
        return Ok(Outcome::NotFound);
    }
    Ok(Outcome::Found(antiderivative(*func, &ctx.var)))
}

/// The antiderivative of `func(x)` with respect to `x`. Total over all
/// recognized tags; callers pre-check that the argument is the bare variable.
pub(crate) fn antiderivative(func: Func, var: &str) -> Expr {
    let x = || Expr::var(var);
    let apply = |f: Func| Expr::apply(f, x());
    match func {
        Func::Sin => apply(Func::Cos).negate(),
        Func::Cos => apply(Func::Sin),
        Func::Tan => log_abs(apply(Func::Cos)).negate(),
        Func::Cot => log_abs(apply(Func::Sin)),
        Func::Sec => log_abs(Expr::Add(
            apply(Func::Sec).boxed(),
            apply(Func::Tan).boxed(),
        )),
        Func::Csc => log_abs(Expr::Sub(
            apply(Func::Csc).boxed(),
            apply(Func::Cot).boxed(),
        )),
        Func::Asin => Expr::Add(
            mul(x(), apply(Func::Asin)).boxed(),
            sqrt(sub(one(), square(x()))).boxed(),
        ),
        Func::Acos => Expr::Sub(
            mul(x(), apply(Func::Acos)).boxed(),
            sqrt(sub(one(), square(x()))).boxed(),
        ),
        Func::Atan => Expr::Sub(
            mul(x(), apply(Func::Atan)).boxed(),
            half_log_one_plus_square(x()).boxed(),
        ),
        Func::Acot => Expr::Add(
            mul(x(), apply(Func::Acot)).boxed(),
            half_log_one_plus_square(x()).boxed(),
        ),
        Func::Sinh => apply(Func::Cosh),
        Func::Cosh => apply(Func::Sinh),
        Func::Tanh => Expr::apply(Func::Log, apply(Func::Cosh)),
        Func::Asinh => Expr::Sub(
            mul(x(), apply(Func::Asinh)).boxed(),
            sqrt(Expr::Add(square(x()).boxed(), one().boxed())).boxed(),
        ),
        Func::Acosh => Expr::Sub(
            mul(x(), apply(Func::Acosh)).boxed(),
            sqrt(Expr::Sub(square(x()).boxed(), one().boxed())).boxed(),
        ),
        Func::Atanh => Expr::Add(
            mul(x(), apply(Func::Atanh)).boxed(),
            half_log(sub(one(), square(x()))).boxed(),
        ),
        Func::Exp => apply(Func::Exp),
        Func::Log => Expr::Sub(mul(x(), apply(Func::Log)).boxed(), x().boxed()),
        Func::Abs => div(mul(x(), apply(Func::Abs)), Expr::integer(2)),
        Func::Sgn => apply(Func::Abs),
    }
}

fn square(expr: Expr) -> Expr {
    Expr::Pow(expr.boxed(), Expr::integer(2).boxed())
}

fn half_log_one_plus_square(x: Expr) -> Expr {
    half_log(Expr::Add(one().boxed(), square(x).boxed()))
}

fn half_log(arg: Expr) -> Expr {
    div(Expr::apply(Func::Log, arg), Expr::integer(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculus::differentiate;
    use crate::simplify::equivalent;

    #[test]
    fn every_entry_survives_the_differentiation_round_trip() {
        let tags = [
            Func::Sin,
            Func::Cos,
            Func::Tan,
            Func::Cot,
            Func::Sec,
            Func::Csc,
            Func::Asin,
            Func::Acos,
            Func::Atan,
            Func::Acot,
            Func::Sinh,
            Func::Cosh,
            Func::Tanh,
            Func::Asinh,
            Func::Acosh,
            Func::Atanh,
            Func::Exp,
            Func::Log,
            Func::Abs,
        ];
        for func in tags {
            let primitive = antiderivative(func, "x");
            let derived = differentiate("x", &primitive);
            let original = Expr::apply(func, Expr::var("x"));
            assert!(
                equivalent(&derived, &original),
                "round trip failed for {}: d/dx {} = {}",
                func.name(),
                primitive,
                derived
            );
        }
    }
}
