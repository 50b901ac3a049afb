//! Reduction formulas for integer powers of elementary functions, bounded by
//! the configured maximum power. A failed recursive step fails the whole
//! chain; no partial result is ever returned.

use crate::error::Result;
use crate::expr::{div, mul, sub, Expr, Func};

use super::common::as_integer;
use super::{dispatch, Context, Outcome};

pub(crate) fn reduce(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let Expr::Pow(base, exp) = expr else {
        return Ok(Outcome::NotFound);
    };
    let Expr::Apply(func, arg) = &**base else {
        return Ok(Outcome::NotFound);
    };
    if arg.as_variable() != Some(ctx.var.as_str()) {
        return Ok(Outcome::NotFound);
    }
    let Some(n) = as_integer(exp) else {
        return Ok(Outcome::NotFound);
    };
    if n < 2 || n > i64::from(ctx.limits.max_power) {
        return Ok(Outcome::NotFound);
    }
    reduce_power(ctx, *func, n)
}

fn reduce_power(ctx: &Context, func: Func, n: i64) -> Result<Outcome> {
    ctx.cancel.check()?;
    let x = || Expr::var(&ctx.var);
    let f = |power: i64| {
        let applied = Expr::apply(func, x());
        if power == 1 {
            applied
        } else {
            Expr::Pow(applied.boxed(), Expr::integer(power).boxed())
        }
    };

    // Closed base cases at the square, recursion above it.
    if n == 2 {
        if let Some(squared) = square_case(ctx, func) {
            return Ok(Outcome::Found(squared));
        }
    }

    let result = match func {
        Func::Sin => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(
                    mul(Expr::apply(Func::Cos, x()).negate(), f(n - 1)),
                    Expr::integer(n),
                )
                .boxed(),
                mul(Expr::constant(n - 1, n), lower).boxed(),
            )
        }
        Func::Cos => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(
                    mul(Expr::apply(Func::Sin, x()), f(n - 1)),
                    Expr::integer(n),
                )
                .boxed(),
                mul(Expr::constant(n - 1, n), lower).boxed(),
            )
        }
        Func::Tan => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            sub(div(f(n - 1), Expr::integer(n - 1)), lower)
        }
        Func::Cot => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            sub(div(f(n - 1), Expr::integer(n - 1)).negate(), lower)
        }
        Func::Sec => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(
                    mul(f(n - 2), Expr::apply(Func::Tan, x())),
                    Expr::integer(n - 1),
                )
                .boxed(),
                mul(Expr::constant(n - 2, n - 1), lower).boxed(),
            )
        }
        Func::Csc => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(
                    mul(f(n - 2), Expr::apply(Func::Cot, x())),
                    Expr::integer(n - 1),
                )
                .negate()
                .boxed(),
                mul(Expr::constant(n - 2, n - 1), lower).boxed(),
            )
        }
        Func::Sinh => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            sub(
                div(
                    mul(Expr::apply(Func::Cosh, x()), f(n - 1)),
                    Expr::integer(n),
                ),
                mul(Expr::constant(n - 1, n), lower),
            )
        }
        Func::Cosh => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(
                    mul(Expr::apply(Func::Sinh, x()), f(n - 1)),
                    Expr::integer(n),
                )
                .boxed(),
                mul(Expr::constant(n - 1, n), lower).boxed(),
            )
        }
        Func::Tanh => {
            let Outcome::Found(lower) = lower_power(ctx, func, n - 2)? else {
                return Ok(Outcome::NotFound);
            };
            Expr::Add(
                div(f(n - 1), Expr::integer(n - 1)).negate().boxed(),
                lower.boxed(),
            )
        }
        Func::Log => {
            // x log^n - n * lower(n - 1); depth shrinks by one per step.
            let Outcome::Found(lower) = lower_power(ctx, func, n - 1)? else {
                return Ok(Outcome::NotFound);
            };
            sub(mul(x(), f(n)), mul(Expr::integer(n), lower))
        }
        _ => return Ok(Outcome::NotFound),
    };
    Ok(Outcome::Found(result))
}

fn lower_power(ctx: &Context, func: Func, power: i64) -> Result<Outcome> {
    if power == 0 {
        return Ok(Outcome::Found(Expr::var(&ctx.var)));
    }
    let applied = Expr::apply(func, Expr::var(&ctx.var));
    let integrand = if power == 1 {
        applied
    } else {
        Expr::Pow(applied.boxed(), Expr::integer(power).boxed())
    };
    dispatch(ctx, &integrand)
}

fn square_case(ctx: &Context, func: Func) -> Option<Expr> {
    let x = || Expr::var(&ctx.var);
    let double = || mul(Expr::integer(2), x());
    let closed = match func {
        // x/2 - sin(2x)/4
        Func::Sin => sub(
            div(x(), Expr::integer(2)),
            div(Expr::apply(Func::Sin, double()), Expr::integer(4)),
        ),
        Func::Cos => Expr::Add(
            div(x(), Expr::integer(2)).boxed(),
            div(Expr::apply(Func::Sin, double()), Expr::integer(4)).boxed(),
        ),
        Func::Tan => sub(Expr::apply(Func::Tan, x()), x()),
        Func::Cot => sub(Expr::apply(Func::Cot, x()).negate(), x()),
        Func::Sec => Expr::apply(Func::Tan, x()),
        Func::Csc => Expr::apply(Func::Cot, x()).negate(),
        Func::Sinh => sub(
            div(Expr::apply(Func::Sinh, double()), Expr::integer(4)),
            div(x(), Expr::integer(2)),
        ),
        Func::Cosh => Expr::Add(
            div(Expr::apply(Func::Sinh, double()), Expr::integer(4)).boxed(),
            div(x(), Expr::integer(2)).boxed(),
        ),
        Func::Tanh => sub(x(), Expr::apply(Func::Tanh, x())),
        _ => return None,
    };
    Some(closed)
}

#[cfg(test)]
mod tests {
    use super::super::{integrate_expr, IntegrationLimits, Outcome};
    use super::*;
    use crate::calculus::differentiate;
    use crate::calculus::integrate::CancelToken;
    use crate::parser::parse_expr;
    use crate::simplify::equivalent;

    fn found(input: &str) -> Expr {
        let expr = parse_expr(input).unwrap();
        match integrate_expr(
            "x",
            &expr,
            &IntegrationLimits::default(),
            &CancelToken::new(),
        )
        .unwrap()
        {
            Outcome::Found(result) => result,
            Outcome::NotFound => panic!("expected a closed form for {input}"),
        }
    }

    #[test]
    fn square_bases_match_the_closed_forms() {
        assert!(equivalent(
            &found("sin(x)^2"),
            &parse_expr("x/2 - sin(2*x)/4").unwrap()
        ));
        assert!(equivalent(
            &found("cos(x)^2"),
            &parse_expr("x/2 + sin(2*x)/4").unwrap()
        ));
    }

    #[test]
    fn higher_powers_round_trip() {
        for input in ["sin(x)^3", "cos(x)^5", "tan(x)^3", "log(x)^3", "sec(x)^4"] {
            let result = found(input);
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &parse_expr(input).unwrap()),
                "round trip failed for {input}"
            );
        }
    }

    #[test]
    fn powers_beyond_the_bound_are_rejected() {
        let limits = IntegrationLimits {
            max_power: 2,
            ..IntegrationLimits::default()
        };
        let expr = parse_expr("sin(x)^5").unwrap();
        let outcome =
            integrate_expr("x", &expr, &limits, &CancelToken::new()).unwrap();
        assert!(matches!(outcome, Outcome::NotFound));
    }
}
