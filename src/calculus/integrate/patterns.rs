//! Closed forms for a fixed set of integrand shapes: products of
//! exponentials and trigonometric functions of linear arguments, and square
//! roots of quadratics. Shapes are matched exactly; coefficients whose sign
//! cannot be established stay unintegrated.

use num_traits::{One, Signed, Zero};

use crate::error::Result;
use crate::expr::{div, mul, sqrt, Expr, Func, Rational};
use crate::polynomial::Poly;
use crate::simplify::simplify;

use super::common::{flatten_product, linear_parts};
use super::{Context, Outcome};

pub(crate) fn special_patterns(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let (constant, factors) = flatten_product(expr);
    let matched = match factors.as_slice() {
        [single] => sqrt_pattern(ctx, single)?,
        [first, second] => pair_pattern(ctx, first, second)?,
        _ => None,
    };
    Ok(match matched {
        Some(result) => Outcome::Found(simplify(scale(constant, result))),
        None => Outcome::NotFound,
    })
}

fn scale(constant: Rational, expr: Expr) -> Expr {
    if constant.is_one() {
        expr
    } else {
        mul(Expr::Constant(constant), expr)
    }
}

struct LinearArg {
    slope: Rational,
    intercept: Rational,
}

fn linear_argument(ctx: &Context, arg: &Expr) -> Option<LinearArg> {
    let (slope, intercept) = linear_parts(arg, &ctx.var)?;
    Some(LinearArg { slope, intercept })
}

fn pair_pattern(ctx: &Context, first: &Expr, second: &Expr) -> Result<Option<Expr>> {
    let (Expr::Apply(f, p), Expr::Apply(g, q)) = (first, second) else {
        return Ok(None);
    };
    let (Some(p), Some(q)) = (linear_argument(ctx, p), linear_argument(ctx, q)) else {
        return Ok(None);
    };
    let result = match (f, g) {
        (Func::Exp, Func::Sin) => Some(exp_trig(ctx, &p, &q, true)),
        (Func::Sin, Func::Exp) => Some(exp_trig(ctx, &q, &p, true)),
        (Func::Exp, Func::Cos) => Some(exp_trig(ctx, &p, &q, false)),
        (Func::Cos, Func::Exp) => Some(exp_trig(ctx, &q, &p, false)),
        (Func::Sin, Func::Sin) => Some(sin_sin(ctx, &p, &q)),
        (Func::Cos, Func::Cos) => Some(cos_cos(ctx, &p, &q)),
        (Func::Sin, Func::Cos) => Some(sin_cos(ctx, &p, &q)),
        (Func::Cos, Func::Sin) => Some(sin_cos(ctx, &q, &p)),
        _ => None,
    };
    Ok(result)
}

fn rebuild_linear(ctx: &Context, arg: &LinearArg) -> Expr {
    let x = Expr::var(&ctx.var);
    let scaled = if arg.slope.is_one() {
        x
    } else {
        mul(Expr::Constant(arg.slope.clone()), x)
    };
    if arg.intercept.is_zero() {
        scaled
    } else {
        Expr::Add(scaled.boxed(), Expr::Constant(arg.intercept.clone()).boxed())
    }
}

/// `∫ exp(ax+b)·sin(cx+d)` and the cosine variant, by the standard
/// two-applications-of-parts identity.
fn exp_trig(ctx: &Context, exp_arg: &LinearArg, trig_arg: &LinearArg, is_sin: bool) -> Expr {
    let a = exp_arg.slope.clone();
    let c = trig_arg.slope.clone();
    let denom = a.clone() * a.clone() + c.clone() * c.clone();
    let exponential = Expr::apply(Func::Exp, rebuild_linear(ctx, exp_arg));
    let sin_term = Expr::apply(Func::Sin, rebuild_linear(ctx, trig_arg));
    let cos_term = Expr::apply(Func::Cos, rebuild_linear(ctx, trig_arg));
    let combination = if is_sin {
        // (a sin - c cos)
        Expr::Sub(
            mul(Expr::Constant(a), sin_term).boxed(),
            mul(Expr::Constant(c), cos_term).boxed(),
        )
    } else {
        // (a cos + c sin)
        Expr::Add(
            mul(Expr::Constant(a), cos_term).boxed(),
            mul(Expr::Constant(c), sin_term).boxed(),
        )
    };
    div(mul(exponential, combination), Expr::Constant(denom))
}

/// Antiderivative of `cos(kx + m)`, degenerating to a linear term when the
/// frequency vanishes.
fn cos_antiderivative(ctx: &Context, k: Rational, m: Rational) -> Expr {
    if k.is_zero() {
        return mul(
            Expr::apply(Func::Cos, Expr::Constant(m)),
            Expr::var(&ctx.var),
        );
    }
    let arg = rebuild_linear(
        ctx,
        &LinearArg {
            slope: k.clone(),
            intercept: m,
        },
    );
    div(Expr::apply(Func::Sin, arg), Expr::Constant(k))
}

fn sin_antiderivative(ctx: &Context, k: Rational, m: Rational) -> Expr {
    if k.is_zero() {
        return mul(
            Expr::apply(Func::Sin, Expr::Constant(m)),
            Expr::var(&ctx.var),
        );
    }
    let arg = rebuild_linear(
        ctx,
        &LinearArg {
            slope: k.clone(),
            intercept: m,
        },
    );
    div(Expr::apply(Func::Cos, arg), Expr::Constant(-k))
}

/// sin A · sin B = (cos(A-B) - cos(A+B))/2.
fn sin_sin(ctx: &Context, p: &LinearArg, q: &LinearArg) -> Expr {
    let difference = cos_antiderivative(
        ctx,
        p.slope.clone() - q.slope.clone(),
        p.intercept.clone() - q.intercept.clone(),
    );
    let sum = cos_antiderivative(
        ctx,
        p.slope.clone() + q.slope.clone(),
        p.intercept.clone() + q.intercept.clone(),
    );
    div(Expr::Sub(difference.boxed(), sum.boxed()), Expr::integer(2))
}

/// cos A · cos B = (cos(A-B) + cos(A+B))/2.
fn cos_cos(ctx: &Context, p: &LinearArg, q: &LinearArg) -> Expr {
    let difference = cos_antiderivative(
        ctx,
        p.slope.clone() - q.slope.clone(),
        p.intercept.clone() - q.intercept.clone(),
    );
    let sum = cos_antiderivative(
        ctx,
        p.slope.clone() + q.slope.clone(),
        p.intercept.clone() + q.intercept.clone(),
    );
    div(Expr::Add(difference.boxed(), sum.boxed()), Expr::integer(2))
}

/// sin A · cos B = (sin(A+B) + sin(A-B))/2.
fn sin_cos(ctx: &Context, p: &LinearArg, q: &LinearArg) -> Expr {
    let sum = sin_antiderivative(
        ctx,
        p.slope.clone() + q.slope.clone(),
        p.intercept.clone() + q.intercept.clone(),
    );
    let difference = sin_antiderivative(
        ctx,
        p.slope.clone() - q.slope.clone(),
        p.intercept.clone() - q.intercept.clone(),
    );
    div(Expr::Add(sum.boxed(), difference.boxed()), Expr::integer(2))
}

fn sqrt_pattern(ctx: &Context, factor: &Expr) -> Result<Option<Expr>> {
    let Expr::Pow(base, exp) = factor else {
        return Ok(None);
    };
    let Expr::Constant(exponent) = &**exp else {
        return Ok(None);
    };
    let half = Rational::new(1.into(), 2.into());
    let quad = match Poly::from_expr(base, &ctx.var) {
        Some(poly) if poly.degree() == Some(2) => poly,
        _ => return Ok(None),
    };
    if *exponent == half {
        Ok(sqrt_quadratic(ctx, &quad))
    } else if *exponent == -half {
        Ok(inverse_sqrt_quadratic(ctx, &quad))
    } else {
        Ok(None)
    }
}

/// `∫ dx/sqrt(ax² + bx + c)`, case split on the signs of the leading
/// coefficient and the discriminant.
fn inverse_sqrt_quadratic(ctx: &Context, quad: &Poly) -> Option<Expr> {
    let a = quad.coeff(2);
    let b = quad.coeff(1);
    let c = quad.coeff(0);
    let disc = b.clone() * b.clone() - Rational::from_integer(4.into()) * a.clone() * c;
    let x = Expr::var(&ctx.var);
    let linear = Expr::Add(
        mul(
            Expr::Constant(Rational::from_integer(2.into()) * a.clone()),
            x.clone(),
        )
        .boxed(),
        Expr::Constant(b.clone()).boxed(),
    );

    if a.is_positive() {
        let root_a = sqrt(Expr::Constant(a.clone()));
        if disc.is_negative() {
            let scaled = div(linear, sqrt(Expr::Constant(-disc)));
            return Some(div(Expr::apply(Func::Asinh, scaled), root_a));
        }
        if disc.is_positive() {
            let scaled = div(linear, sqrt(Expr::Constant(disc)));
            return Some(div(Expr::apply(Func::Acosh, scaled), root_a));
        }
        // Degenerate square: sqrt(q) = sqrt(a)*|x + b/(2a)|.
        let shift = b / (Rational::from_integer(2.into()) * a);
        let shifted = if shift.is_zero() {
            x
        } else {
            Expr::Add(x.boxed(), Expr::Constant(shift).boxed())
        };
        return Some(div(
            mul(
                Expr::apply(Func::Sgn, shifted.clone()),
                Expr::apply(Func::Log, Expr::apply(Func::Abs, shifted)),
            ),
            root_a,
        ));
    }
    if disc.is_positive() {
        // Negative leading coefficient: an arcsine branch.
        let scaled = div(linear, sqrt(Expr::Constant(disc)));
        return Some(
            div(
                Expr::apply(Func::Asin, scaled),
                sqrt(Expr::Constant(-a)),
            )
            .negate(),
        );
    }
    None
}

/// `∫ sqrt(ax² + bx + c) = (2ax + b)sqrt(q)/(4a) + (4ac - b²)/(8a) ∫dx/sqrt(q)`.
fn sqrt_quadratic(ctx: &Context, quad: &Poly) -> Option<Expr> {
    let a = quad.coeff(2);
    let b = quad.coeff(1);
    let c = quad.coeff(0);
    let disc = b.clone() * b.clone() - Rational::from_integer(4.into()) * a.clone() * c;
    let x = Expr::var(&ctx.var);
    let quad_expr = quad.to_expr(&ctx.var);
    let linear = Expr::Add(
        mul(
            Expr::Constant(Rational::from_integer(2.into()) * a.clone()),
            x,
        )
        .boxed(),
        Expr::Constant(b).boxed(),
    );
    let leading = div(
        mul(linear, sqrt(quad_expr)),
        Expr::Constant(Rational::from_integer(4.into()) * a.clone()),
    );
    if disc.is_zero() {
        return Some(leading);
    }
    let inverse = inverse_sqrt_quadratic(ctx, quad)?;
    let rest_scale = -disc / (Rational::from_integer(8.into()) * a);
    Some(Expr::Add(
        leading.boxed(),
        mul(Expr::Constant(rest_scale), inverse).boxed(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::{integrate_expr, CancelToken, IntegrationLimits, Outcome};
    use crate::calculus::differentiate;
    use crate::parser::parse_expr;
    use crate::simplify::equivalent;

    fn found(input: &str) -> crate::expr::Expr {
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
    fn exponential_trigonometric_products_round_trip() {
        for input in ["exp(x)*sin(x)", "exp(2*x + 1)*cos(3*x)", "exp(-x)*cos(x)"] {
            let result = found(input);
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &parse_expr(input).unwrap()),
                "round trip failed for {input}"
            );
        }
    }

    #[test]
    fn trigonometric_products_cover_the_coefficient_cases() {
        for input in [
            "sin(2*x)*sin(3*x)",
            "sin(2*x)*sin(2*x + 1)",
            "cos(x)*cos(4*x)",
            "sin(3*x)*cos(3*x)",
            "sin(x)*cos(2*x)",
        ] {
            let result = found(input);
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &parse_expr(input).unwrap()),
                "round trip failed for {input}"
            );
        }
    }

    #[test]
    fn square_roots_of_quadratics_round_trip() {
        for input in [
            "1/sqrt(x^2 + 1)",
            "1/sqrt(x^2 - 1)",
            "1/sqrt(1 - x^2)",
            "sqrt(x^2 + 4)",
            "sqrt(1 - x^2)",
        ] {
            let result = found(input);
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &parse_expr(input).unwrap()),
                "round trip failed for {input}"
            );
        }
    }

    #[test]
    fn imaginary_square_roots_are_not_claimed() {
        let expr = parse_expr("1/sqrt(-1 - x^2)").unwrap();
        let outcome = integrate_expr(
            "x",
            &expr,
            &IntegrationLimits::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(matches!(outcome, Outcome::NotFound));
    }
}
