//! Integration of rational functions: polynomial long division, partial
//! fractions over linear factors, and closed forms for powers of a single
//! irreducible quadratic.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::Result;
use crate::expr::{div, mul, pow, sqrt, Expr, Func, Rational};
use crate::factor::{factor_polynomial, Factor};
use crate::polynomial::Poly;
use crate::simplify::simplify;

use super::common::log_abs;
use super::terms::ProductSplit;
use super::{dispatch, Context, Outcome};

pub(crate) fn integrate_rational(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let Some((numer, denom)) = as_rational_function(expr, &ctx.var) else {
        return Ok(Outcome::NotFound);
    };
    if denom.degree().unwrap_or(0) == 0 {
        return Ok(Outcome::NotFound);
    }
    let max_degree = ctx.limits.max_degree as usize;
    if numer.degree().unwrap_or(0) > max_degree || denom.degree().unwrap_or(0) > max_degree {
        return Ok(Outcome::NotFound);
    }
    integrate_fraction(ctx, numer, denom)
}

fn as_rational_function(expr: &Expr, var: &str) -> Option<(Poly, Poly)> {
    let split = ProductSplit::of(expr);
    if split.denom.is_empty() {
        return None;
    }
    let numer = Poly::from_expr(&split.numer.combine_product(), var)?;
    let denom = Poly::from_expr(&split.denom.combine_product(), var)?;
    if denom.is_zero() {
        return None;
    }
    Some((numer, denom))
}

fn integrate_fraction(ctx: &Context, numer: Poly, denom: Poly) -> Result<Outcome> {
    if numer.is_zero() {
        return Ok(Outcome::Found(crate::expr::zero()));
    }
    // Long division first so the remainder is a proper fraction.
    if numer.degree() >= denom.degree() {
        let (quotient, remainder) = numer.div_rem(&denom);
        let poly_part = quotient.antiderivative().to_expr(&ctx.var);
        if remainder.is_zero() {
            return Ok(Outcome::Found(poly_part));
        }
        let Outcome::Found(rest) = integrate_fraction(ctx, remainder, denom)? else {
            return Ok(Outcome::NotFound);
        };
        return Ok(Outcome::Found(Expr::Add(poly_part.boxed(), rest.boxed())));
    }

    let factorization = factor_polynomial(&denom);
    let scaled_numer = numer.scale(&(Rational::one() / factorization.constant.clone()));
    if factorization.all_linear() {
        return partial_fractions(ctx, scaled_numer, &factorization.factors);
    }
    if let [Factor { poly, multiplicity }] = factorization.factors.as_slice() {
        if poly.degree() == Some(2) {
            return quadratic_power(ctx, scaled_numer, poly, *multiplicity);
        }
    }
    Ok(Outcome::NotFound)
}

/// Exact partial-fraction decomposition over linear factors by repeated
/// evaluation at each root and deflation of the fraction.
fn partial_fractions(ctx: &Context, numer: Poly, factors: &[Factor]) -> Result<Outcome> {
    let mut numer = numer;
    let mut denom = factors
        .iter()
        .fold(Poly::one(), |acc, f| acc * f.poly.pow(f.multiplicity));
    let mut terms: Vec<(Rational, Rational, usize)> = Vec::new();

    for factor in factors {
        let Some(root) = factor.poly.linear_root() else {
            return Ok(Outcome::NotFound);
        };
        for k in (1..=factor.multiplicity).rev() {
            ctx.cancel.check()?;
            let Some(cofactor) = denom.div_exact(&factor.poly.pow(k)) else {
                return Ok(Outcome::NotFound);
            };
            let cofactor_at_root = cofactor.evaluate(&root);
            if cofactor_at_root.is_zero() {
                return Ok(Outcome::NotFound);
            }
            let coefficient = numer.evaluate(&root) / cofactor_at_root;
            if !coefficient.is_zero() {
                terms.push((coefficient.clone(), root.clone(), k));
            }
            let reduced = numer - cofactor.scale(&coefficient);
            let Some(deflated) = reduced.div_exact(&factor.poly) else {
                return Ok(Outcome::NotFound);
            };
            numer = deflated;
            let Some(smaller) = denom.div_exact(&factor.poly) else {
                return Ok(Outcome::NotFound);
            };
            denom = smaller;
        }
    }

    let x = Expr::var(&ctx.var);
    let result = terms
        .into_iter()
        .map(|(coefficient, root, k)| {
            let shifted = if root.is_zero() {
                x.clone()
            } else {
                Expr::Sub(x.clone().boxed(), Expr::Constant(root).boxed())
            };
            if k == 1 {
                mul(Expr::Constant(coefficient), log_abs(shifted))
            } else {
                // c * (x - a)^(1 - k) / (1 - k)
                let order = Rational::from_integer(BigInt::from(1 - k as i64));
                mul(
                    Expr::Constant(coefficient / order.clone()),
                    pow(shifted, Expr::Constant(order)),
                )
            }
        })
        .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()))
        .unwrap_or_else(crate::expr::zero);
    Ok(Outcome::Found(result))
}

/// `∫ p(x)/q(x)^n` for a single monic irreducible quadratic `q`. The `n = 1`
/// closed form combines a logarithm with an arctangent; higher powers use the
/// standard reduction formula, recursing through the dispatcher.
fn quadratic_power(ctx: &Context, numer: Poly, quad: &Poly, n: usize) -> Result<Outcome> {
    let a = quad.coeff(2);
    let b = quad.coeff(1);
    let c = quad.coeff(0);
    let disc = b.clone() * b.clone() - Rational::from_integer(4.into()) * a.clone() * c;
    if !disc.is_negative() {
        return Ok(Outcome::NotFound);
    }

    // Reduce the numerator below the quadratic; the quotient integrates
    // against a lower power through the dispatcher.
    if numer.degree().unwrap_or(0) >= 2 {
        let (quotient, remainder) = numer.div_rem(quad);
        let lower = if n == 1 {
            quotient.antiderivative().to_expr(&ctx.var)
        } else {
            let integrand = div(
                quotient.to_expr(&ctx.var),
                pow(quad.to_expr(&ctx.var), Expr::integer(n as i64 - 1)),
            );
            let Outcome::Found(lower) = dispatch(ctx, &integrand)? else {
                return Ok(Outcome::NotFound);
            };
            lower
        };
        let Outcome::Found(rest) = quadratic_power(ctx, remainder, quad, n)? else {
            return Ok(Outcome::NotFound);
        };
        return Ok(Outcome::Found(Expr::Add(lower.boxed(), rest.boxed())));
    }

    let alpha = numer.coeff(1);
    let beta = numer.coeff(0);
    let quad_expr = quad.to_expr(&ctx.var);
    let two_a = Rational::from_integer(2.into()) * a.clone();
    // alpha/(2a) * (2ax + b) + (beta - alpha*b/(2a)) reassembles the
    // numerator exactly.
    let log_scale = alpha.clone() / two_a.clone();
    let rest_scale = beta - alpha * b.clone() / two_a;

    let mut parts: Vec<Expr> = Vec::new();
    if !log_scale.is_zero() {
        let derivative_part = if n == 1 {
            mul(
                Expr::Constant(log_scale),
                Expr::apply(Func::Log, quad_expr.clone()),
            )
        } else {
            // (2ax + b)/q^n integrates to q^(1-n)/(1-n).
            let order = Rational::from_integer(BigInt::from(1 - n as i64));
            mul(
                Expr::Constant(log_scale / order.clone()),
                pow(quad_expr.clone(), Expr::Constant(order)),
            )
        };
        parts.push(derivative_part);
    }
    if !rest_scale.is_zero() {
        let Outcome::Found(pure) = pure_quadratic_power(ctx, quad, n, &disc)? else {
            return Ok(Outcome::NotFound);
        };
        parts.push(mul(Expr::Constant(rest_scale), pure));
    }
    let result = parts
        .into_iter()
        .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()))
        .unwrap_or_else(crate::expr::zero);
    Ok(Outcome::Found(simplify(result)))
}

/// `J_n = ∫ dx/q^n` for an irreducible quadratic `q` with negative
/// discriminant.
fn pure_quadratic_power(
    ctx: &Context,
    quad: &Poly,
    n: usize,
    disc: &Rational,
) -> Result<Outcome> {
    ctx.cancel.check()?;
    let a = quad.coeff(2);
    let b = quad.coeff(1);
    let var = Expr::var(&ctx.var);
    let linear = Expr::Add(
        mul(
            Expr::Constant(Rational::from_integer(2.into()) * a.clone()),
            var,
        )
        .boxed(),
        Expr::Constant(b).boxed(),
    );
    let neg_disc = -disc.clone();
    if n == 1 {
        let root = sqrt(Expr::Constant(neg_disc.clone()));
        let scaled = div(linear, root.clone());
        return Ok(Outcome::Found(mul(
            div(Expr::integer(2), root),
            Expr::apply(Func::Atan, scaled),
        )));
    }
    // J_n = (2ax + b)/((n-1)(-disc) q^(n-1)) + 2a(2n-3)/((n-1)(-disc)) J_(n-1)
    let n_minus_one = Rational::from_integer(BigInt::from(n as i64 - 1));
    let denominator_scale = n_minus_one * neg_disc;
    let quad_expr = quad.to_expr(&ctx.var);
    let leading = div(
        mul(
            Expr::Constant(Rational::one() / denominator_scale.clone()),
            linear,
        ),
        pow(quad_expr.clone(), Expr::integer(n as i64 - 1)),
    );
    let lower_integrand = div(
        crate::expr::one(),
        pow(quad_expr, Expr::integer(n as i64 - 1)),
    );
    let Outcome::Found(lower) = dispatch(ctx, &lower_integrand)? else {
        return Ok(Outcome::NotFound);
    };
    let lower_scale =
        Rational::from_integer(2.into()) * a * Rational::from_integer(BigInt::from(2 * n as i64 - 3))
            / denominator_scale;
    Ok(Outcome::Found(Expr::Add(
        leading.boxed(),
        mul(Expr::Constant(lower_scale), lower).boxed(),
    )))
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
    fn simple_pole_gives_a_logarithm() {
        let result = found("1/(x - 2)");
        assert!(equivalent(
            &result,
            &parse_expr("log(abs(x - 2))").unwrap()
        ));
    }

    #[test]
    fn repeated_pole_gives_a_power_term() {
        let result = found("1/(x - 1)^2");
        assert!(equivalent(&result, &parse_expr("-1/(x - 1)").unwrap()));
    }

    #[test]
    fn irreducible_quadratic_gives_an_arctangent() {
        let result = found("1/(x^2 + 1)");
        assert!(equivalent(&result, &parse_expr("atan(x)").unwrap()));
    }

    #[test]
    fn quadratic_power_reduction_round_trips() {
        for input in ["1/(x^2 + 1)^2", "(x + 3)/(x^2 + 2*x + 5)^2"] {
            let result = found(input);
            let derived = differentiate("x", &result);
            assert!(
                equivalent(&derived, &parse_expr(input).unwrap()),
                "round trip failed for {input}"
            );
        }
    }

    #[test]
    fn mixed_irreducible_and_linear_factors_are_not_claimed() {
        let expr = parse_expr("1/(x*(x^2 + 1))").unwrap();
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
