//! Heuristic integration by parts, restricted to a decidable whitelist of
//! product shapes: `∫u'v = uv - ∫uv'` with an explicit priority for picking
//! the factor that gets differentiated.

use num_traits::One;

use crate::calculus::differentiate;
use crate::error::Result;
use crate::expr::{contains_integral, mul, sub, Expr, Func, Rational};
use crate::simplify::{simplify, simplify_fully};

use super::common::{
    as_integer, polynomial_degree, rebuild_product, split_constant_factors,
};
use super::{dispatch, Context, Outcome};

const MAX_PART_DEGREE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FactorKind {
    Polynomial,
    ExpLinear,
    SinLinear,
    CosLinear,
    LogBare,
    AtanBare,
    AtanhBare,
    VarPower,
}

pub(crate) fn integrate_by_parts(ctx: &Context, expr: &Expr) -> Result<Outcome> {
    let (free, factors) = split_constant_factors(expr, &ctx.var);
    if factors.len() < 2 {
        return Ok(Outcome::NotFound);
    }
    let Some(kinds) = classify_all(ctx, &factors) else {
        return Ok(Outcome::NotFound);
    };
    if !allow_partial_integration(&kinds) {
        return Ok(Outcome::NotFound);
    }
    let Some(v_index) = clever_choice(&kinds) else {
        return Ok(Outcome::NotFound);
    };

    let v = factors[v_index].clone();
    let u_prime_factors: Vec<Expr> = factors
        .iter()
        .enumerate()
        .filter_map(|(i, f)| (i != v_index).then(|| f.clone()))
        .collect();
    let u_prime = rebuild_product(Rational::one(), u_prime_factors);

    let Outcome::Found(u) = dispatch(ctx, &u_prime)? else {
        return Ok(Outcome::NotFound);
    };
    if contains_integral(&u) {
        return Ok(Outcome::NotFound);
    }
    let dv = simplify_fully(differentiate(&ctx.var, &v));
    let remainder = simplify_fully(mul(u.clone(), dv));
    let Outcome::Found(rest) = dispatch(ctx, &remainder)? else {
        return Ok(Outcome::NotFound);
    };
    // No partial, possibly-wrong result: the recursive integral must be
    // fully resolved.
    if contains_integral(&rest) {
        return Ok(Outcome::NotFound);
    }
    let product = simplify(mul(u, v));
    let result = sub(product, rest);
    Ok(Outcome::Found(apply_free(free, result)))
}

fn apply_free(free: Expr, result: Expr) -> Expr {
    if free.is_one() {
        result
    } else {
        simplify(mul(free, result))
    }
}

fn classify_all(ctx: &Context, factors: &[Expr]) -> Option<Vec<FactorKind>> {
    factors
        .iter()
        .map(|factor| classify(ctx, factor))
        .collect()
}

fn classify(ctx: &Context, factor: &Expr) -> Option<FactorKind> {
    let var = ctx.var.as_str();
    if let Some(degree) = polynomial_degree(factor, var) {
        if degree >= 1 && degree <= MAX_PART_DEGREE {
            return Some(FactorKind::Polynomial);
        }
        return None;
    }
    match factor {
        Expr::Apply(func, arg) => {
            let linear = super::common::linear_parts(arg, var).is_some();
            let bare = arg.as_variable() == Some(var);
            match func {
                Func::Exp if linear => Some(FactorKind::ExpLinear),
                Func::Sin if linear => Some(FactorKind::SinLinear),
                Func::Cos if linear => Some(FactorKind::CosLinear),
                Func::Log if bare => Some(FactorKind::LogBare),
                Func::Atan if bare => Some(FactorKind::AtanBare),
                Func::Atanh if bare => Some(FactorKind::AtanhBare),
                _ => None,
            }
        }
        Expr::Pow(base, exp) => {
            let constant_exp =
                matches!(**exp, Expr::Constant(_)) || as_integer(exp).is_some();
            if base.as_variable() == Some(var) && constant_exp {
                Some(FactorKind::VarPower)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// The fixed whitelist of shapes this engine accepts.
fn allow_partial_integration(kinds: &[FactorKind]) -> bool {
    let count = |kind: FactorKind| kinds.iter().filter(|k| **k == kind).count();
    let polynomials = count(FactorKind::Polynomial);
    let oscillators = count(FactorKind::ExpLinear)
        + count(FactorKind::SinLinear)
        + count(FactorKind::CosLinear);
    let logs = count(FactorKind::LogBare);
    let arcs = count(FactorKind::AtanBare) + count(FactorKind::AtanhBare);
    let powers = count(FactorKind::VarPower);

    // polynomial times one exp/sin/cos of a linear argument
    if polynomials == 1 && oscillators == 1 && kinds.len() == 2 {
        return true;
    }
    // polynomial times log(x), arctan(x) or artanh(x)
    if polynomials == 1 && logs + arcs == 1 && kinds.len() == 2 {
        return true;
    }
    // log(x) over a power of the variable
    if logs == 1 && powers == 1 && kinds.len() == 2 {
        return true;
    }
    // products of exp/sin/cos factors only
    if oscillators == kinds.len() && kinds.len() >= 2 {
        return true;
    }
    false
}

/// Priority for the factor that plays `v` (the one that is differentiated):
/// logarithms first, then inverse functions, then the polynomial part. For
/// all-trigonometric products any factor works; when an exponential appears
/// among trigonometric factors the exponential is chosen.
fn clever_choice(kinds: &[FactorKind]) -> Option<usize> {
    let find = |kind: FactorKind| kinds.iter().position(|k| *k == kind);
    if let Some(index) = find(FactorKind::LogBare) {
        return Some(index);
    }
    if let Some(index) = find(FactorKind::AtanBare).or_else(|| find(FactorKind::AtanhBare)) {
        return Some(index);
    }
    if let Some(index) = find(FactorKind::Polynomial) {
        return Some(index);
    }
    let all_trig = kinds
        .iter()
        .all(|k| matches!(k, FactorKind::SinLinear | FactorKind::CosLinear));
    if all_trig {
        return Some(0);
    }
    let all_oscillating = kinds.iter().all(|k| {
        matches!(
            k,
            FactorKind::ExpLinear | FactorKind::SinLinear | FactorKind::CosLinear
        )
    });
    if all_oscillating {
        return find(FactorKind::ExpLinear);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_accepts_the_supported_shapes() {
        use FactorKind::*;
        assert!(allow_partial_integration(&[Polynomial, SinLinear]));
        assert!(allow_partial_integration(&[Polynomial, LogBare]));
        assert!(allow_partial_integration(&[Polynomial, AtanBare]));
        assert!(allow_partial_integration(&[LogBare, VarPower]));
        assert!(allow_partial_integration(&[ExpLinear, SinLinear]));
    }

    #[test]
    fn whitelist_rejects_everything_else() {
        use FactorKind::*;
        assert!(!allow_partial_integration(&[Polynomial, Polynomial]));
        assert!(!allow_partial_integration(&[LogBare, LogBare]));
        assert!(!allow_partial_integration(&[Polynomial, SinLinear, LogBare]));
    }

    #[test]
    fn v_priority_prefers_logs_then_arcs_then_polynomials() {
        use FactorKind::*;
        assert_eq!(clever_choice(&[Polynomial, LogBare]), Some(1));
        assert_eq!(clever_choice(&[AtanBare, Polynomial]), Some(0));
        assert_eq!(clever_choice(&[Polynomial, SinLinear]), Some(0));
        assert_eq!(clever_choice(&[SinLinear, ExpLinear]), Some(1));
        assert_eq!(clever_choice(&[SinLinear, CosLinear]), Some(0));
    }
}
