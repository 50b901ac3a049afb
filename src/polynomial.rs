//! Exact univariate polynomials over arbitrary-precision rationals.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::expr::{contains_var, Expr, Rational};

/// Dense coefficient vector, index = power. Invariant: no trailing zeros;
/// the zero polynomial has an empty vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<Rational>,
}

impl Poly {
    pub fn new(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
            coeffs.pop();
        }
        Poly { coeffs }
    }

    pub fn zero() -> Self {
        Poly { coeffs: Vec::new() }
    }

    pub fn one() -> Self {
        Poly::constant(Rational::one())
    }

    pub fn constant(c: Rational) -> Self {
        if c.is_zero() {
            return Poly::zero();
        }
        Poly { coeffs: vec![c] }
    }

    pub fn variable() -> Self {
        Poly::monomial(Rational::one(), 1)
    }

    pub fn monomial(c: Rational, power: usize) -> Self {
        if c.is_zero() {
            return Poly::zero();
        }
        let mut coeffs = vec![Rational::zero(); power + 1];
        coeffs[power] = c;
        Poly { coeffs }
    }

    pub fn degree(&self) -> Option<usize> {
        if self.coeffs.is_empty() {
            None
        } else {
            Some(self.coeffs.len() - 1)
        }
    }

    pub fn coeff(&self, power: usize) -> Rational {
        self.coeffs
            .get(power)
            .cloned()
            .unwrap_or_else(Rational::zero)
    }

    /// Coefficient slice, index = power.
    pub fn coefficients(&self) -> &[Rational] {
        &self.coeffs
    }

    pub fn leading_coeff(&self) -> Rational {
        self.coeffs
            .last()
            .cloned()
            .unwrap_or_else(Rational::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_one()
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    pub fn scale(&self, k: &Rational) -> Self {
        if k.is_zero() {
            return Poly::zero();
        }
        Poly::new(self.coeffs.iter().map(|c| c * k).collect())
    }

    pub fn monic(&self) -> Self {
        let lc = self.leading_coeff();
        if lc.is_zero() {
            return self.clone();
        }
        self.scale(&(Rational::one() / lc))
    }

    pub fn pow(&self, exp: usize) -> Self {
        let mut result = Poly::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = result * base.clone();
            }
            base = base.clone() * base;
            n /= 2;
        }
        result
    }

    pub fn derivative(&self) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, c)| c * Rational::from_integer(BigInt::from(power)))
            .collect();
        Poly::new(coeffs)
    }

    /// Termwise antiderivative with zero constant term.
    pub fn antiderivative(&self) -> Self {
        let mut coeffs = vec![Rational::zero()];
        for (power, c) in self.coeffs.iter().enumerate() {
            coeffs.push(c / Rational::from_integer(BigInt::from(power + 1)));
        }
        Poly::new(coeffs)
    }

    pub fn evaluate(&self, x: &Rational) -> Rational {
        let mut acc = Rational::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc * x.clone() + c.clone();
        }
        acc
    }

    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        if divisor.is_zero() {
            return (Poly::zero(), self.clone());
        }
        let divisor_degree = divisor.degree().unwrap();
        let divisor_lc = divisor.leading_coeff();
        let mut remainder = self.clone();
        let mut quotient = Poly::zero();
        while let Some(r_deg) = remainder.degree() {
            if r_deg < divisor_degree {
                break;
            }
            let power = r_deg - divisor_degree;
            let coeff = remainder.leading_coeff() / divisor_lc.clone();
            let term = Poly::monomial(coeff, power);
            quotient = quotient + term.clone();
            remainder = remainder - term * divisor.clone();
        }
        (quotient, remainder)
    }

    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (q, r) = self.div_rem(divisor);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    pub fn gcd(a: &Poly, b: &Poly) -> Poly {
        let mut r0 = a.clone();
        let mut r1 = b.clone();
        while !r1.is_zero() {
            let (_, r) = r0.div_rem(&r1);
            r0 = r1;
            r1 = r;
        }
        r0.monic()
    }

    /// Yun-style square-free split: pairwise coprime parts with their
    /// multiplicities, excluding the constant content.
    pub fn square_free_decomposition(&self) -> Vec<(Poly, usize)> {
        if self.degree().unwrap_or(0) == 0 {
            return Vec::new();
        }
        let mut result = Vec::new();
        let mut i = 1;
        let mut g = Poly::gcd(self, &self.derivative());
        let mut y = self.div_exact(&g).unwrap_or_else(Poly::zero);
        while !y.is_one() && !y.is_zero() {
            let z = Poly::gcd(&y, &g);
            let part = y.div_exact(&z).unwrap_or_else(Poly::zero);
            if !part.is_one() {
                result.push((part, i));
            }
            y = z.clone();
            g = g.div_exact(&z).unwrap_or_else(Poly::zero);
            i += 1;
        }
        if !g.is_one() && !g.is_zero() {
            for (part, mult) in g.square_free_decomposition() {
                result.push((part, mult + i - 1));
            }
        }
        result
    }

    pub fn linear_root(&self) -> Option<Rational> {
        if self.degree()? != 1 {
            return None;
        }
        let a = self.coeff(1);
        let b = self.coeff(0);
        if a.is_zero() {
            None
        } else {
            Some(-b / a)
        }
    }

    pub fn from_expr(expr: &Expr, var: &str) -> Option<Self> {
        if !contains_var(expr, var) {
            return extract_rational(expr).map(Poly::constant);
        }
        match expr {
            Expr::Variable(name) if name == var => Some(Poly::variable()),
            Expr::Add(a, b) => Some(Poly::from_expr(a, var)? + Poly::from_expr(b, var)?),
            Expr::Sub(a, b) => Some(Poly::from_expr(a, var)? - Poly::from_expr(b, var)?),
            Expr::Mul(a, b) => Some(Poly::from_expr(a, var)? * Poly::from_expr(b, var)?),
            Expr::Div(a, b) => {
                let denom = extract_rational(b)?;
                if denom.is_zero() {
                    return None;
                }
                Some(Poly::from_expr(a, var)?.scale(&(Rational::one() / denom)))
            }
            Expr::Neg(inner) => Some(-Poly::from_expr(inner, var)?),
            Expr::Pow(base, exp) => {
                let power = match extract_rational(exp) {
                    Some(k) if k.is_integer() && !k.is_negative() => k.to_integer().to_usize()?,
                    _ => return None,
                };
                Some(Poly::from_expr(base, var)?.pow(power))
            }
            _ => None,
        }
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        if self.is_zero() {
            return Expr::Constant(Rational::zero());
        }
        let mut terms: Vec<Expr> = Vec::new();
        for (power, coeff) in self.coeffs.iter().enumerate() {
            if coeff.is_zero() {
                continue;
            }
            let term = match power {
                0 => Expr::Constant(coeff.clone()),
                _ => {
                    let base = if power == 1 {
                        Expr::Variable(var.to_string())
                    } else {
                        Expr::Pow(
                            Expr::Variable(var.to_string()).boxed(),
                            Expr::integer(power as i64).boxed(),
                        )
                    };
                    if coeff.is_one() {
                        base
                    } else {
                        Expr::Mul(Expr::Constant(coeff.clone()).boxed(), base.boxed())
                    }
                }
            };
            terms.push(term);
        }
        terms
            .into_iter()
            .reduce(|a, b| Expr::Add(a.boxed(), b.boxed()))
            .unwrap()
    }
}

impl std::ops::Add for Poly {
    type Output = Poly;
    fn add(self, rhs: Poly) -> Poly {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let mut coeffs = vec![Rational::zero(); len];
        for (i, c) in self.coeffs.into_iter().enumerate() {
            coeffs[i] += c;
        }
        for (i, c) in rhs.coeffs.into_iter().enumerate() {
            coeffs[i] += c;
        }
        Poly::new(coeffs)
    }
}

impl std::ops::Sub for Poly {
    type Output = Poly;
    fn sub(self, rhs: Poly) -> Poly {
        self + (-rhs)
    }
}

impl std::ops::Neg for Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        Poly::new(self.coeffs.into_iter().map(|c| -c).collect())
    }
}

impl std::ops::Mul for Poly {
    type Output = Poly;
    fn mul(self, rhs: Poly) -> Poly {
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero();
        }
        let mut coeffs =
            vec![Rational::zero(); self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Poly::new(coeffs)
    }
}

/// If `a` and `b` are both polynomial in `var` and `a = r * b` for a single
/// rational `r`, return `r`.
pub fn rational_multiple(a: &Expr, b: &Expr, var: &str) -> Option<Rational> {
    let pa = Poly::from_expr(a, var)?;
    let pb = Poly::from_expr(b, var)?;
    if pb.is_zero() {
        return None;
    }
    if pa.is_zero() {
        return Some(Rational::zero());
    }
    if pa.degree() != pb.degree() {
        return None;
    }
    let ratio = pa.leading_coeff() / pb.leading_coeff();
    if pb.scale(&ratio) == pa {
        Some(ratio)
    } else {
        None
    }
}

fn extract_rational(expr: &Expr) -> Option<Rational> {
    match expr {
        Expr::Constant(c) => Some(c.clone()),
        Expr::Neg(inner) => extract_rational(inner).map(|c| -c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn poly(input: &str) -> Poly {
        Poly::from_expr(&parse_expr(input).unwrap(), "x").unwrap()
    }

    #[test]
    fn division_with_remainder() {
        let (q, r) = poly("x^3 + 2*x + 1").div_rem(&poly("x + 1"));
        assert_eq!(q, poly("x^2 - x + 3"));
        assert_eq!(r, Poly::constant(Rational::from_integer((-2).into())));
    }

    #[test]
    fn gcd_is_monic_common_factor() {
        let a = poly("x^2 - 1");
        let b = poly("x^2 + 2*x + 1");
        assert_eq!(Poly::gcd(&a, &b), poly("x + 1"));
    }

    #[test]
    fn square_free_split_orders_multiplicities() {
        // (x - 1)^2 * (x + 2)
        let p = poly("(x - 1)^2 * (x + 2)");
        let parts = p.square_free_decomposition();
        assert_eq!(parts.len(), 2);
        assert!(parts.contains(&(poly("x + 2"), 1)));
        assert!(parts.contains(&(poly("x - 1"), 2)));
    }

    #[test]
    fn antiderivative_inverts_derivative() {
        let p = poly("3*x^2 + 4*x - 5");
        assert_eq!(p.antiderivative().derivative(), p);
    }

    #[test]
    fn detects_rational_multiples() {
        let a = parse_expr("4*x/15").unwrap();
        let b = parse_expr("2*x/105").unwrap();
        assert_eq!(
            rational_multiple(&a, &b, "x"),
            Some(Rational::new(14.into(), 1.into()))
        );
        let c = parse_expr("x^2").unwrap();
        assert_eq!(rational_multiple(&a, &c, "x"), None);
    }
}
