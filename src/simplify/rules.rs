use std::collections::{BTreeMap, BTreeSet, HashMap};

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::expr::{one, zero, Expr, Func, Rational};
use crate::polynomial::Poly;

const MAX_PASSES: usize = 24;

pub fn simplify(expr: Expr) -> Expr {
    let mut cache = HashMap::new();
    simplify_cached(expr, &mut cache)
}

/// Apply simplification passes until the expression stops changing or the
/// iteration cap is reached.
pub fn simplify_fully(expr: Expr) -> Expr {
    simplify_with_limit(expr, MAX_PASSES)
}

/// Apply simplification passes up to `max_iters`, returning the last value if
/// convergence is not reached.
pub fn simplify_with_limit(expr: Expr, max_iters: usize) -> Expr {
    let mut cache = HashMap::new();
    let mut current = expr;
    for _ in 0..max_iters {
        let next = simplify_cached(current.clone(), &mut cache);
        if next == current {
            return current;
        }
        current = next;
    }
    current
}

fn simplify_cached(expr: Expr, cache: &mut HashMap<Expr, Expr>) -> Expr {
    if let Some(hit) = cache.get(&expr) {
        return hit.clone();
    }
    let key = expr.clone();
    let result = match expr {
        Expr::Add(a, b) => simplify_add(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Sub(a, b) => simplify_sub(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Mul(a, b) => simplify_mul(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Div(a, b) => simplify_div(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Pow(a, b) => simplify_pow(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Neg(a) => simplify_neg(simplify_cached(*a, cache)),
        Expr::Apply(f, a) => simplify_apply(f, simplify_cached(*a, cache)),
        Expr::Integral(node) => {
            let mut node = *node;
            node.integrand = simplify_cached(node.integrand, cache);
            node.bounds = node.bounds.map(|(lo, hi)| {
                (simplify_cached(lo, cache), simplify_cached(hi, cache))
            });
            Expr::Integral(Box::new(node))
        }
        leaf => leaf,
    };
    cache.insert(key, result.clone());
    result
}

pub fn simplify_add(x: Expr, y: Expr) -> Expr {
    let mut constant = Rational::zero();
    let mut terms: BTreeMap<Expr, Rational> = BTreeMap::new();
    collect_terms(&x, false, &mut constant, &mut terms);
    collect_terms(&y, false, &mut constant, &mut terms);
    rebuild_sum(constant, terms)
}

pub fn simplify_sub(x: Expr, y: Expr) -> Expr {
    let mut constant = Rational::zero();
    let mut terms: BTreeMap<Expr, Rational> = BTreeMap::new();
    collect_terms(&x, false, &mut constant, &mut terms);
    collect_terms(&y, true, &mut constant, &mut terms);
    rebuild_sum(constant, terms)
}

pub fn simplify_neg(x: Expr) -> Expr {
    match x {
        Expr::Constant(c) => Expr::Constant(-c),
        Expr::Neg(inner) => *inner,
        other => simplify_mul(Expr::integer(-1), other),
    }
}

pub fn simplify_mul(x: Expr, y: Expr) -> Expr {
    let mut state = ProductState::new();
    state.collect(&x, false);
    state.collect(&y, false);
    state.rebuild().unwrap_or(Expr::Mul(x.boxed(), y.boxed()))
}

pub fn simplify_div(x: Expr, y: Expr) -> Expr {
    let mut state = ProductState::new();
    state.collect(&x, false);
    state.collect(&y, true);
    let rebuilt = state
        .rebuild()
        .unwrap_or(Expr::Div(x.boxed(), y.boxed()));
    cancel_quotient(rebuilt)
}

fn collect_terms(
    expr: &Expr,
    negated: bool,
    constant: &mut Rational,
    terms: &mut BTreeMap<Expr, Rational>,
) {
    match expr {
        Expr::Add(a, b) => {
            collect_terms(a, negated, constant, terms);
            collect_terms(b, negated, constant, terms);
        }
        Expr::Sub(a, b) => {
            collect_terms(a, negated, constant, terms);
            collect_terms(b, !negated, constant, terms);
        }
        Expr::Neg(inner) => collect_terms(inner, !negated, constant, terms),
        Expr::Constant(c) => {
            if negated {
                *constant -= c;
            } else {
                *constant += c;
            }
        }
        other => {
            let (mut coeff, base) = split_coeff(other);
            if negated {
                coeff = -coeff;
            }
            let entry = terms.entry(base).or_insert_with(Rational::zero);
            *entry += coeff;
        }
    }
}

/// Peel a leading rational coefficient off a canonical term.
pub(crate) fn split_coeff(term: &Expr) -> (Rational, Expr) {
    match term {
        Expr::Constant(c) => (c.clone(), one()),
        Expr::Neg(inner) => {
            let (coeff, base) = split_coeff(inner);
            (-coeff, base)
        }
        Expr::Mul(a, b) => match &**a {
            Expr::Constant(c) => {
                let (coeff, base) = split_coeff(b);
                (c * coeff, base)
            }
            _ => (Rational::one(), term.clone()),
        },
        _ => (Rational::one(), term.clone()),
    }
}

fn make_term(coeff: Rational, base: Expr) -> Expr {
    if base.is_one() {
        return Expr::Constant(coeff);
    }
    if coeff.is_one() {
        base
    } else {
        Expr::Mul(Expr::Constant(coeff).boxed(), base.boxed())
    }
}

fn rebuild_sum(constant: Rational, terms: BTreeMap<Expr, Rational>) -> Expr {
    let mut parts: Vec<Expr> = terms
        .into_iter()
        .filter(|(_, coeff)| !coeff.is_zero())
        .map(|(base, coeff)| make_term(coeff, base))
        .collect();
    if !constant.is_zero() {
        parts.push(Expr::Constant(constant));
    }
    match parts.len() {
        0 => zero(),
        _ => parts
            .into_iter()
            .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()))
            .unwrap(),
    }
}

struct ProductState {
    constant: Rational,
    exponents: BTreeMap<Expr, Rational>,
    division_by_zero: bool,
}

impl ProductState {
    fn new() -> Self {
        ProductState {
            constant: Rational::one(),
            exponents: BTreeMap::new(),
            division_by_zero: false,
        }
    }

    fn collect(&mut self, expr: &Expr, inverted: bool) {
        if self.division_by_zero {
            return;
        }
        match expr {
            Expr::Constant(c) => {
                if inverted {
                    if c.is_zero() {
                        self.division_by_zero = true;
                    } else {
                        self.constant /= c;
                    }
                } else {
                    self.constant *= c;
                }
            }
            Expr::Neg(inner) => {
                self.constant = -self.constant.clone();
                self.collect(inner, inverted);
            }
            Expr::Mul(a, b) => {
                self.collect(a, inverted);
                self.collect(b, inverted);
            }
            Expr::Div(a, b) => {
                self.collect(a, inverted);
                self.collect(b, !inverted);
            }
            Expr::Pow(base, exp) => match &**exp {
                Expr::Constant(k) => {
                    if let Expr::Constant(c) = &**base {
                        if k.is_integer() && !(c.is_zero() && k.is_negative()) {
                            let folded = pow_rational(c, k);
                            self.collect(&Expr::Constant(folded), inverted);
                            return;
                        }
                    }
                    let k = if inverted { -k.clone() } else { k.clone() };
                    self.push(base, k);
                }
                _ => self.push(expr, signed_one(inverted)),
            },
            other => self.push(other, signed_one(inverted)),
        }
    }

    fn push(&mut self, base: &Expr, exponent: Rational) {
        let entry = self
            .exponents
            .entry(base.clone())
            .or_insert_with(Rational::zero);
        *entry += exponent;
    }

    fn rebuild(self) -> Option<Expr> {
        if self.division_by_zero {
            return None;
        }
        if self.constant.is_zero() {
            return Some(zero());
        }
        let mut numer: Vec<Expr> = Vec::new();
        let mut denom: Vec<Expr> = Vec::new();
        for (base, exp) in self.exponents {
            if exp.is_zero() {
                continue;
            }
            if exp.is_negative() {
                denom.push(make_pow(base, -exp));
            } else {
                numer.push(make_pow(base, exp));
            }
        }
        let numerator = match numer.len() {
            0 => None,
            _ => numer
                .into_iter()
                .reduce(|acc, f| Expr::Mul(acc.boxed(), f.boxed())),
        };
        let body = if denom.is_empty() {
            numerator
        } else {
            let denominator = denom
                .into_iter()
                .reduce(|acc, f| Expr::Mul(acc.boxed(), f.boxed()))
                .unwrap();
            Some(Expr::Div(
                numerator.unwrap_or_else(one).boxed(),
                denominator.boxed(),
            ))
        };
        Some(match body {
            None => Expr::Constant(self.constant),
            Some(body) => make_term(self.constant, body),
        })
    }
}

fn signed_one(inverted: bool) -> Rational {
    if inverted {
        -Rational::one()
    } else {
        Rational::one()
    }
}

fn make_pow(base: Expr, exp: Rational) -> Expr {
    if exp.is_one() {
        return base;
    }
    if let Expr::Apply(Func::Exp, arg) = &base {
        return Expr::Apply(
            Func::Exp,
            simplify_mul(Expr::Constant(exp), (**arg).clone()).boxed(),
        );
    }
    Expr::Pow(base.boxed(), Expr::Constant(exp).boxed())
}

pub fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    match &exp {
        Expr::Constant(k) => {
            if k.is_zero() {
                return one();
            }
            if k.is_one() {
                return base;
            }
            match &base {
                Expr::Constant(c) => {
                    if c.is_zero() {
                        if k.is_negative() {
                            return Expr::Pow(base.boxed(), exp.boxed());
                        }
                        return zero();
                    }
                    if c.is_one() {
                        return one();
                    }
                    if k.is_integer() {
                        return Expr::Constant(pow_rational(c, k));
                    }
                    if let Some(folded) = fold_half_integer_pow(c, k) {
                        return folded;
                    }
                    Expr::Pow(base.boxed(), exp.boxed())
                }
                Expr::Pow(inner_base, inner_exp) => {
                    if k.is_integer() {
                        if let Expr::Constant(inner_k) = &**inner_exp {
                            return simplify_pow(
                                (**inner_base).clone(),
                                Expr::Constant(inner_k * k),
                            );
                        }
                    }
                    Expr::Pow(base.boxed(), exp.boxed())
                }
                Expr::Apply(Func::Exp, arg) => Expr::Apply(
                    Func::Exp,
                    simplify_mul(exp.clone(), (**arg).clone()).boxed(),
                ),
                Expr::Mul(_, _) | Expr::Div(_, _) | Expr::Neg(_) if k.is_integer() => {
                    let mut state = ProductState::new();
                    state.collect(&base, false);
                    let scaled = ProductState {
                        constant: pow_rational(&state.constant, k),
                        exponents: state
                            .exponents
                            .into_iter()
                            .map(|(b, e)| (b, e * k))
                            .collect(),
                        division_by_zero: state.division_by_zero,
                    };
                    scaled
                        .rebuild()
                        .unwrap_or(Expr::Pow(base.boxed(), exp.boxed()))
                }
                _ => Expr::Pow(base.boxed(), exp.boxed()),
            }
        }
        _ => match &base {
            Expr::Constant(c) if c.is_one() => one(),
            Expr::Apply(Func::Exp, arg) => Expr::Apply(
                Func::Exp,
                simplify_mul((**arg).clone(), exp.clone()).boxed(),
            ),
            _ => Expr::Pow(base.boxed(), exp.boxed()),
        },
    }
}

fn simplify_apply(func: Func, arg: Expr) -> Expr {
    if arg.is_zero() {
        match func {
            Func::Sin
            | Func::Tan
            | Func::Sinh
            | Func::Tanh
            | Func::Asin
            | Func::Atan
            | Func::Asinh
            | Func::Atanh
            | Func::Sgn
            | Func::Abs => return zero(),
            Func::Cos | Func::Sec | Func::Cosh | Func::Exp => return one(),
            _ => {}
        }
    }
    if arg.is_one() && func == Func::Log {
        return zero();
    }
    if let Expr::Constant(c) = &arg {
        match func {
            Func::Abs => return Expr::Constant(c.abs()),
            Func::Sgn => {
                return Expr::integer(if c.is_negative() { -1 } else { 1 });
            }
            _ => {}
        }
    }
    // exp(c*log(a)) is a^c.
    if func == Func::Exp {
        if let Expr::Mul(coeff, rest) = &arg {
            if let (Expr::Constant(k), Expr::Apply(Func::Log, log_arg)) = (&**coeff, &**rest) {
                return simplify_pow((**log_arg).clone(), Expr::Constant(k.clone()));
            }
        }
    }
    // Inverse pairs that are valid on the shared domain.
    if let Expr::Apply(inner_func, inner_arg) = &arg {
        let collapses = matches!(
            (func, inner_func),
            (Func::Exp, Func::Log)
                | (Func::Log, Func::Exp)
                | (Func::Sin, Func::Asin)
                | (Func::Cos, Func::Acos)
                | (Func::Tan, Func::Atan)
                | (Func::Sinh, Func::Asinh)
                | (Func::Cosh, Func::Acosh)
                | (Func::Tanh, Func::Atanh)
        );
        if collapses {
            return (**inner_arg).clone();
        }
        match (func, inner_func) {
            (Func::Cos, Func::Asin) | (Func::Sin, Func::Acos) => {
                let squared = simplify_pow((**inner_arg).clone(), Expr::integer(2));
                return Expr::Pow(
                    simplify_sub(one(), squared).boxed(),
                    Expr::constant(1, 2).boxed(),
                );
            }
            _ => {}
        }
    }
    if func == Func::Abs {
        if let Expr::Apply(Func::Abs, inner) = &arg {
            return Expr::Apply(Func::Abs, inner.clone());
        }
    }
    // Parity: pull a negative coefficient out of the argument.
    let (coeff, base) = split_coeff(&arg);
    if coeff.is_negative() && (func.is_odd() || func.is_even()) {
        let positive = make_term(-coeff.clone(), base.clone());
        if func.is_odd() {
            return simplify_neg(Expr::Apply(func, positive.boxed()));
        }
        return simplify_apply(func, positive);
    }
    if func == Func::Abs && !coeff.is_one() && !coeff.is_zero() && !base.is_one() {
        return make_term(coeff.abs(), Expr::Apply(Func::Abs, base.boxed()));
    }
    Expr::Apply(func, arg.boxed())
}

/// Cancel a common polynomial divisor in a single-variable quotient.
fn cancel_quotient(expr: Expr) -> Expr {
    let (numer, denom) = match expr {
        Expr::Mul(coeff, rest)
            if matches!(*coeff, Expr::Constant(_)) && matches!(*rest, Expr::Div(_, _)) =>
        {
            return match cancel_quotient(*rest) {
                reduced @ Expr::Div(_, _) => Expr::Mul(coeff, reduced.boxed()),
                other => simplify_mul(*coeff, other),
            };
        }
        Expr::Div(numer, denom) => (numer, denom),
        other => return other,
    };

    let mut vars = BTreeSet::new();
    collect_vars(&numer, &mut vars);
    collect_vars(&denom, &mut vars);
    let fallback = |numer: Box<Expr>, denom: Box<Expr>| Expr::Div(numer, denom);
    if vars.len() != 1 {
        return fallback(numer, denom);
    }
    let var = vars.iter().next().unwrap().clone();
    let (Some(num_poly), Some(den_poly)) =
        (Poly::from_expr(&numer, &var), Poly::from_expr(&denom, &var))
    else {
        return fallback(numer, denom);
    };
    if den_poly.is_zero() || num_poly.is_zero() {
        return fallback(numer, denom);
    }
    let gcd = Poly::gcd(&num_poly, &den_poly);
    if gcd.degree().unwrap_or(0) == 0 {
        return fallback(numer, denom);
    }
    let (Some(num_reduced), Some(den_reduced)) =
        (num_poly.div_exact(&gcd), den_poly.div_exact(&gcd))
    else {
        return fallback(numer, denom);
    };
    let num_expr = num_reduced.to_expr(&var);
    if den_reduced.degree().unwrap_or(0) == 0 {
        let scale = Rational::one() / den_reduced.leading_coeff();
        return simplify_mul(Expr::Constant(scale), num_expr);
    }
    Expr::Div(num_expr.boxed(), den_reduced.to_expr(&var).boxed())
}

fn collect_vars(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Variable(name) => {
            out.insert(name.clone());
        }
        Expr::Constant(_) => {}
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            collect_vars(a, out);
            collect_vars(b, out);
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => collect_vars(inner, out),
        Expr::Integral(node) => {
            collect_vars(&node.integrand, out);
            if let Some((lo, hi)) = &node.bounds {
                collect_vars(lo, out);
                collect_vars(hi, out);
            }
        }
    }
}

pub(crate) fn pow_rational(base: &Rational, exp: &Rational) -> Rational {
    if exp.is_zero() {
        return Rational::one();
    }
    if !exp.is_integer() {
        return base.clone();
    }
    let n = exp.to_integer();
    if let Some(power) = n.abs().to_u32() {
        let num = base.numer().pow(power);
        let den = base.denom().pow(power);
        if n.is_negative() {
            return Rational::new(den, num);
        }
        return Rational::new(num, den);
    }
    base.clone()
}

fn fold_half_integer_pow(base: &Rational, exp: &Rational) -> Option<Expr> {
    if exp.denom() != &BigInt::from(2) || base.is_negative() {
        return None;
    }
    let root_num = integer_sqrt_exact(base.numer())?;
    let root_den = integer_sqrt_exact(base.denom())?;
    let root = Rational::new(root_num, root_den);
    let int_exp = Expr::Constant(Rational::from_integer(exp.numer().clone()));
    Some(simplify_pow(Expr::Constant(root), int_exp))
}

fn integer_sqrt_exact(n: &BigInt) -> Option<BigInt> {
    if n.is_negative() {
        return None;
    }
    let root = n.sqrt();
    if &root * &root == *n {
        Some(root)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, div, mul, pow, sub};

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn collects_like_terms() {
        let expr = add(mul(Expr::integer(2), x()), x());
        assert_eq!(
            simplify(expr),
            Expr::Mul(Expr::integer(3).boxed(), x().boxed())
        );
    }

    #[test]
    fn cancels_opposite_terms() {
        let expr = sub(mul(Expr::integer(5), x()), mul(Expr::integer(5), x()));
        assert!(simplify(expr).is_zero());
    }

    #[test]
    fn cancels_common_product_factors() {
        let expr = div(mul(x(), Expr::apply(Func::Exp, x())), x());
        assert_eq!(simplify_fully(expr), Expr::apply(Func::Exp, x()));
    }

    #[test]
    fn folds_constant_powers() {
        let expr = pow(Expr::integer(4), Expr::constant(1, 2));
        assert_eq!(simplify(expr), Expr::integer(2));
        let expr = pow(Expr::integer(2), Expr::integer(10));
        assert_eq!(simplify(expr), Expr::integer(1024));
    }

    #[test]
    fn exp_power_becomes_scaled_argument() {
        let expr = pow(Expr::apply(Func::Exp, x()), Expr::integer(3));
        assert_eq!(
            simplify(expr),
            Expr::apply(Func::Exp, mul(Expr::integer(3), x()))
        );
    }

    #[test]
    fn odd_function_pulls_sign() {
        let expr = Expr::apply(Func::Sin, mul(Expr::integer(-2), x()));
        let expected = mul(
            Expr::integer(-1),
            Expr::apply(Func::Sin, mul(Expr::integer(2), x())),
        );
        assert_eq!(simplify(expr), simplify(expected));
    }

    #[test]
    fn polynomial_quotients_reduce() {
        // (x^2 - 1)/(x - 1) -> x + 1
        let numer = sub(pow(x(), Expr::integer(2)), one());
        let denom = sub(x(), one());
        let reduced = simplify_fully(div(numer, denom));
        assert_eq!(reduced, simplify_fully(add(x(), one())));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let expr = div(x(), zero());
        assert!(matches!(simplify(expr), Expr::Div(_, _)));
    }
}
