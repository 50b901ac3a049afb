//! Linearity of the integral: one-level distribution over sums and
//! differences, and pulling variable-free factors out of products.

use crate::error::Result;
use crate::expr::Expr;
use crate::simplify::simplify;

use super::common::{apply_constant_factor, rebuild_product, split_constant_factors};
use super::terms::SumSplit;
use super::{dispatch, integrate_or_residual, Context, Outcome};

/// Split a top-level sum or difference into per-term integrals. Terms whose
/// own dispatch fails stay embedded as unevaluated integral operators, so the
/// split itself always succeeds structurally.
pub(crate) fn split_sum(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let split = SumSplit::of(expr);
    if split.term_count() < 2 {
        return Ok(Outcome::NotFound);
    }
    let mut plus = Vec::with_capacity(split.plus.len());
    for (_, term) in split.plus.iter() {
        plus.push(integrate_or_residual(ctx, term)?);
    }
    let mut minus = Vec::with_capacity(split.minus.len());
    for (_, term) in split.minus.iter() {
        minus.push(integrate_or_residual(ctx, term)?);
    }
    let positive = plus
        .into_iter()
        .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()));
    let negative = minus
        .into_iter()
        .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()));
    let combined = match (positive, negative) {
        (Some(p), Some(n)) => Expr::Sub(p.boxed(), n.boxed()),
        (Some(p), None) => p,
        (None, Some(n)) => n.negate(),
        (None, None) => crate::expr::zero(),
    };
    Ok(Outcome::Found(combined))
}

/// Pull the variable-free part of a product out of the integral. The
/// remainder is dispatched; if it stays unresolved it is kept as an embedded
/// integral operator behind the extracted coefficient.
pub(crate) fn pull_constant_factors(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let (free, dependent) = split_constant_factors(expr, &ctx.var);
    if free.is_one() || dependent.is_empty() {
        return Ok(Outcome::NotFound);
    }
    if simplify(free.clone()).is_zero() {
        return Ok(Outcome::Found(crate::expr::zero()));
    }
    let rest = rebuild_product(num_traits::One::one(), dependent);
    let inner = match dispatch(ctx, &rest)? {
        Outcome::Found(result) => result,
        Outcome::NotFound => Expr::indefinite_integral(rest, ctx.var.clone()),
    };
    Ok(Outcome::Found(apply_constant_factor(free, inner)))
}
