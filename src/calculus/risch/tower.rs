//! Differential-field towers generated by exponential and logarithmic
//! extensions: membership testing and minimal generator growth.

use num_bigint::BigInt;

use crate::error::{CasError, Result};
use crate::expr::{contains_var, Expr, Func, Rational};
use crate::polynomial::{rational_multiple, Poly};
use crate::simplify::simplify_fully;

const MAX_GROW_STEPS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenKind {
    Exp,
    Log,
}

/// One generator `exp(arg)` or `log(arg)` of the tower. Arguments are kept
/// simplified with their constant part stripped, so the rational-multiple
/// comparison works on the variable-dependent part alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generator {
    pub kind: GenKind,
    pub arg: Expr,
}

impl Generator {
    pub fn expr(&self) -> Expr {
        let func = match self.kind {
            GenKind::Exp => Func::Exp,
            GenKind::Log => Func::Log,
        };
        Expr::apply(func, self.arg.clone())
    }
}

/// Membership of an expression in the field `R(x, t1, ..., tn)`.
/// `Undecidable` marks the boundary of the rewrite system; callers must
/// treat it as "not a member".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Algebraic,
    Transcendental,
    Undecidable,
}

#[derive(Clone, Debug, Default)]
pub struct Tower {
    var: String,
    generators: Vec<Generator>,
}

impl Tower {
    pub fn new(var: impl Into<String>) -> Self {
        Tower {
            var: var.into(),
            generators: Vec::new(),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Is `expr` rational over the current field? Sums, products, quotients
    /// and integer or rational constant powers decompose; an exponential or
    /// logarithm matches a generator through the rational-multiple test on
    /// its variable-dependent part.
    pub fn membership(&self, expr: &Expr) -> Membership {
        if !contains_var(expr, &self.var) {
            return Membership::Algebraic;
        }
        match expr {
            Expr::Variable(_) | Expr::Constant(_) => Membership::Algebraic,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                combine(self.membership(a), self.membership(b))
            }
            Expr::Neg(inner) => self.membership(inner),
            Expr::Pow(base, exp) => {
                if contains_var(exp, &self.var) {
                    // A variable exponent is an exponential in disguise; the
                    // normalizer rewrites it, so meeting one here is outside
                    // this decision procedure.
                    Membership::Undecidable
                } else {
                    match &**exp {
                        Expr::Constant(_) | Expr::Neg(_) => self.membership(base),
                        _ => Membership::Undecidable,
                    }
                }
            }
            Expr::Apply(Func::Exp, arg) => self.match_generator(GenKind::Exp, arg),
            Expr::Apply(Func::Log, arg) => self.match_generator(GenKind::Log, arg),
            Expr::Apply(_, _) | Expr::Integral(_) => Membership::Undecidable,
        }
    }

    fn match_generator(&self, kind: GenKind, arg: &Expr) -> Membership {
        let variable_part = self.variable_part(arg);
        let mut comparable = false;
        for generator in self.generators.iter().filter(|g| g.kind == kind) {
            match self.argument_ratio(&variable_part, &generator.arg) {
                ArgumentRatio::Integer => return Membership::Algebraic,
                ArgumentRatio::Fraction(_) | ArgumentRatio::None => comparable = true,
                ArgumentRatio::Unresolvable => {}
            }
        }
        // With only polynomial-argument comparisons every mismatch is a
        // proof; an unresolvable ratio leaves the question open.
        if comparable || self.all_comparisons_decidable(&variable_part, kind) {
            Membership::Transcendental
        } else {
            Membership::Undecidable
        }
    }

    fn all_comparisons_decidable(&self, variable_part: &Expr, kind: GenKind) -> bool {
        if Poly::from_expr(variable_part, &self.var).is_none() {
            return false;
        }
        self.generators
            .iter()
            .filter(|g| g.kind == kind)
            .all(|g| Poly::from_expr(&g.arg, &self.var).is_some())
    }

    /// Grow the tower minimally so that `expr` becomes a member: descend
    /// into the outermost non-member exponential or logarithm and either
    /// refine an existing generator or append a new one.
    pub fn grow_for(&mut self, expr: &Expr) -> Result<()> {
        for _ in 0..MAX_GROW_STEPS {
            if self.membership(expr) == Membership::Algebraic {
                return Ok(());
            }
            let Some((kind, arg)) = self.outermost_unmatched(expr) else {
                // Only undecidable residue is left; the tower cannot be
                // extended any further.
                return Ok(());
            };
            self.absorb(kind, arg)?;
        }
        Err(CasError::Evaluation(
            "generator tower growth did not converge".to_string(),
        ))
    }

    fn absorb(&mut self, kind: GenKind, arg: Expr) -> Result<()> {
        let variable_part = self.variable_part(&arg);
        if kind == GenKind::Exp {
            for index in 0..self.generators.len() {
                if self.generators[index].kind != GenKind::Exp {
                    continue;
                }
                let existing = self.generators[index].arg.clone();
                if let ArgumentRatio::Fraction(denominator) =
                    self.argument_ratio(&variable_part, &existing)
                {
                    // Refine exp(g) to exp(g/q): both the old generator and
                    // the new requirement become integer powers of it.
                    let refined = simplify_fully(Expr::Div(
                        existing.boxed(),
                        Expr::Constant(Rational::from_integer(denominator)).boxed(),
                    ));
                    self.generators[index].arg = refined;
                    return Ok(());
                }
            }
        }
        let generator = Generator {
            kind,
            arg: variable_part,
        };
        if self.generators.contains(&generator) {
            return Err(CasError::Evaluation(
                "duplicate field generator".to_string(),
            ));
        }
        self.generators.push(generator);
        Ok(())
    }

    /// First exponential or logarithm (outermost first) whose argument
    /// depends on the variable and which is not yet a member.
    fn outermost_unmatched(&self, expr: &Expr) -> Option<(GenKind, Expr)> {
        match expr {
            Expr::Variable(_) | Expr::Constant(_) => None,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b)
            | Expr::Pow(a, b) => self
                .outermost_unmatched(a)
                .or_else(|| self.outermost_unmatched(b)),
            Expr::Neg(inner) => self.outermost_unmatched(inner),
            Expr::Apply(func @ (Func::Exp | Func::Log), arg) => {
                if !contains_var(arg, &self.var) {
                    return None;
                }
                let kind = if *func == Func::Exp {
                    GenKind::Exp
                } else {
                    GenKind::Log
                };
                if self.membership(expr) == Membership::Algebraic {
                    None
                } else {
                    Some((kind, (**arg).clone()))
                }
            }
            Expr::Apply(_, arg) => self.outermost_unmatched(arg),
            Expr::Integral(_) => None,
        }
    }

    /// Strip the constant term of a polynomial argument; the constant part
    /// only contributes a constant factor to the generator.
    fn variable_part(&self, arg: &Expr) -> Expr {
        let simplified = simplify_fully(arg.clone());
        let Some(poly) = Poly::from_expr(&simplified, &self.var) else {
            return simplified;
        };
        let stripped = poly - Poly::constant(poly_constant(&simplified, &self.var));
        simplify_fully(stripped.to_expr(&self.var))
    }

    fn argument_ratio(&self, candidate: &Expr, generator_arg: &Expr) -> ArgumentRatio {
        if let Some(ratio) = rational_multiple(candidate, generator_arg, &self.var) {
            if ratio.is_integer() {
                return ArgumentRatio::Integer;
            }
            return ArgumentRatio::Fraction(ratio.denom().clone());
        }
        let quotient = simplify_fully(Expr::Div(
            candidate.clone().boxed(),
            generator_arg.clone().boxed(),
        ));
        if let Expr::Constant(ratio) = &quotient {
            if ratio.is_integer() {
                return ArgumentRatio::Integer;
            }
            return ArgumentRatio::Fraction(ratio.denom().clone());
        }
        if !contains_var(&quotient, &self.var) {
            // Some symbolic but variable-free ratio: not a rational
            // multiple, but provably constant.
            return ArgumentRatio::None;
        }
        if Poly::from_expr(candidate, &self.var).is_some()
            && Poly::from_expr(generator_arg, &self.var).is_some()
        {
            // Polynomial arguments compare exactly.
            return ArgumentRatio::None;
        }
        ArgumentRatio::Unresolvable
    }
}

enum ArgumentRatio {
    /// candidate = k * generator for an integer k
    Integer,
    /// candidate = p/q * generator; the denominator drives refinement
    Fraction(BigInt),
    /// provably not a rational multiple
    None,
    /// comparison beyond the rewrite system
    Unresolvable,
}

fn poly_constant(expr: &Expr, var: &str) -> Rational {
    Poly::from_expr(expr, var)
        .map(|p| p.coeff(0))
        .unwrap_or_else(|| Rational::from_integer(0.into()))
}

fn combine(a: Membership, b: Membership) -> Membership {
    use Membership::*;
    match (a, b) {
        (Undecidable, _) | (_, Undecidable) => Undecidable,
        (Transcendental, _) | (_, Transcendental) => Transcendental,
        (Algebraic, Algebraic) => Algebraic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn rational_expressions_are_members_of_the_base_field() {
        let tower = Tower::new("x");
        let expr = parse_expr("(x^2 + 1)/(x - 3)").unwrap();
        assert_eq!(tower.membership(&expr), Membership::Algebraic);
    }

    #[test]
    fn integer_multiples_of_a_generator_are_members() {
        let mut tower = Tower::new("x");
        tower.grow_for(&parse_expr("exp(x)").unwrap()).unwrap();
        assert_eq!(
            tower.membership(&parse_expr("exp(3*x)").unwrap()),
            Membership::Algebraic
        );
        assert_eq!(
            tower.membership(&parse_expr("x^2*exp(x)").unwrap()),
            Membership::Algebraic
        );
    }

    #[test]
    fn fractional_multiples_refine_the_generator() {
        let mut tower = Tower::new("x");
        tower.grow_for(&parse_expr("exp(x)").unwrap()).unwrap();
        tower.grow_for(&parse_expr("exp(x/2)").unwrap()).unwrap();
        assert_eq!(tower.generators().len(), 1);
        assert_eq!(
            tower.generators()[0].arg,
            simplify_fully(parse_expr("x/2").unwrap())
        );
    }

    #[test]
    fn minimal_generator_for_mixed_exponentials() {
        // x*exp(8x/15) - exp(6x/35) needs exactly exp(2x/105).
        let mut tower = Tower::new("x");
        let expr = parse_expr("x*exp(8*x/15) - exp(6*x/35)").unwrap();
        tower.grow_for(&expr).unwrap();
        assert_eq!(tower.generators().len(), 1);
        assert_eq!(tower.generators()[0].kind, GenKind::Exp);
        assert_eq!(
            tower.generators()[0].arg,
            simplify_fully(parse_expr("2*x/105").unwrap())
        );
        assert_eq!(tower.membership(&expr), Membership::Algebraic);
    }

    #[test]
    fn operator_nodes_are_undecidable() {
        let tower = Tower::new("x");
        let node = Expr::indefinite_integral(parse_expr("exp(x^2)").unwrap(), "x");
        assert_eq!(tower.membership(&node), Membership::Undecidable);
    }

    #[test]
    fn unrelated_trigonometry_is_outside_the_rewrite_system() {
        let tower = Tower::new("x");
        assert_eq!(
            tower.membership(&parse_expr("sin(x)").unwrap()),
            Membership::Undecidable
        );
    }
}
