//! Factorization of rational-coefficient polynomials into monic irreducible
//! powers, as far as rational-root extraction allows.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::expr::{Expr, Rational};
use crate::polynomial::Poly;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factor {
    pub poly: Poly,
    pub multiplicity: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factorization {
    pub constant: Rational,
    pub factors: Vec<Factor>,
}

impl Factorization {
    pub fn all_linear(&self) -> bool {
        self.factors
            .iter()
            .all(|f| f.poly.degree() == Some(1))
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        if self.constant.is_zero() {
            return Expr::Constant(Rational::zero());
        }
        let mut expr = Expr::Constant(self.constant.clone());
        for factor in &self.factors {
            let base = factor.poly.to_expr(var);
            let powered = if factor.multiplicity == 1 {
                base
            } else {
                Expr::Pow(
                    base.boxed(),
                    Expr::integer(factor.multiplicity as i64).boxed(),
                )
            };
            expr = Expr::Mul(expr.boxed(), powered.boxed());
        }
        expr
    }
}

/// Split into monic factors: every rational root becomes a linear factor;
/// leftover quadratics without rational roots are irreducible over the
/// rationals. Leftovers of degree three or more are kept whole, unfactored —
/// callers must not assume they are irreducible.
pub fn factor_polynomial(poly: &Poly) -> Factorization {
    if poly.is_zero() {
        return Factorization {
            constant: Rational::zero(),
            factors: Vec::new(),
        };
    }
    let constant = poly.leading_coeff();
    let monic = poly.monic();
    let mut factors = Vec::new();

    for (part, multiplicity) in square_free_or_self(&monic) {
        let mut current = part;
        while current.degree().unwrap_or(0) >= 1 {
            if current.degree() == Some(1) {
                factors.push(Factor {
                    poly: current.monic(),
                    multiplicity,
                });
                break;
            }
            let Some(root) = find_rational_root(&current) else {
                factors.push(Factor {
                    poly: current.monic(),
                    multiplicity,
                });
                break;
            };
            let divisor = Poly::new(vec![-root, Rational::one()]);
            factors.push(Factor {
                poly: divisor.clone(),
                multiplicity,
            });
            current = current.div_exact(&divisor).unwrap_or_else(Poly::zero);
        }
    }

    factors.sort_by(|a, b| {
        let deg_a = a.poly.degree().unwrap_or(0);
        let deg_b = b.poly.degree().unwrap_or(0);
        deg_a
            .cmp(&deg_b)
            .then_with(|| a.poly.coefficients().cmp(b.poly.coefficients()))
    });

    Factorization { constant, factors }
}

fn square_free_or_self(poly: &Poly) -> Vec<(Poly, usize)> {
    let parts = poly.square_free_decomposition();
    if parts.is_empty() {
        vec![(poly.clone(), 1)]
    } else {
        parts
    }
}

fn find_rational_root(poly: &Poly) -> Option<Rational> {
    let degree = poly.degree()?;
    if degree == 0 {
        return None;
    }
    if degree == 1 {
        return poly.linear_root();
    }

    let int_coeffs = integer_coeffs(poly);
    let leading = int_coeffs.last()?.clone();
    let lowest = int_coeffs
        .iter()
        .find(|c| !c.is_zero())?
        .clone();
    if int_coeffs.first()?.is_zero() {
        return Some(Rational::zero());
    }

    let mut candidates = Vec::new();
    for p in divisors(&lowest) {
        for q in divisors(&leading) {
            if q.is_zero() {
                continue;
            }
            let candidate = Rational::new(p.clone(), q);
            candidates.push(candidate.clone());
            candidates.push(-candidate);
        }
    }
    candidates.sort();
    candidates.dedup();

    candidates
        .into_iter()
        .find(|candidate| poly.evaluate(candidate).is_zero())
}

fn integer_coeffs(poly: &Poly) -> Vec<BigInt> {
    let mut lcm = BigInt::one();
    for coeff in poly.coefficients() {
        lcm = lcm.lcm(coeff.denom());
    }
    poly.coefficients()
        .iter()
        .map(|coeff| (coeff * Rational::from_integer(lcm.clone())).numer().clone())
        .collect()
}

fn divisors(n: &BigInt) -> Vec<BigInt> {
    let abs_n = n.abs();
    if abs_n.is_zero() {
        return vec![BigInt::zero()];
    }
    let mut result = Vec::new();
    let mut d = BigInt::one();
    while &d * &d <= abs_n {
        if (&abs_n % &d).is_zero() {
            result.push(d.clone());
            let other = &abs_n / &d;
            if other != d {
                result.push(other);
            }
        }
        d += 1;
    }
    result.sort();
    result
}
