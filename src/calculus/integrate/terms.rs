//! Sparse, index-addressable term collections for the summands of a sum and
//! the factors of a product. Removal leaves a hole so indices stay stable;
//! iteration over `0..bound()` must skip holes. Re-combining all present
//! terms in index order reproduces the decomposed value.

use num_traits::Signed;

use crate::expr::{one, zero, Expr, Rational};

fn const_exponent(expr: &Expr) -> Option<Rational> {
    match expr {
        Expr::Constant(k) => Some(k.clone()),
        Expr::Neg(inner) => const_exponent(inner).map(|k| -k),
        _ => None,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermSlots {
    slots: Vec<Option<Expr>>,
}

impl TermSlots {
    pub fn new() -> Self {
        TermSlots::default()
    }

    /// One past the highest occupied index ever used.
    pub fn bound(&self) -> usize {
        self.slots.len()
    }

    /// Number of present (non-hole) terms.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Expr> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Remove and return the term at `index`, leaving a hole.
    pub fn take(&mut self, index: usize) -> Option<Expr> {
        self.slots.get_mut(index).and_then(|slot| slot.take())
    }

    /// Restore a term into an existing hole.
    pub fn put(&mut self, index: usize, term: Expr) {
        if let Some(slot) = self.slots.get_mut(index) {
            debug_assert!(slot.is_none(), "restoring into an occupied slot");
            *slot = Some(term);
        }
    }

    pub fn push(&mut self, term: Expr) -> usize {
        self.slots.push(Some(term));
        self.slots.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Expr)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|term| (i, term)))
    }

    pub fn combine_sum(&self) -> Expr {
        self.iter()
            .map(|(_, term)| term.clone())
            .reduce(|acc, term| Expr::Add(acc.boxed(), term.boxed()))
            .unwrap_or_else(zero)
    }

    pub fn combine_product(&self) -> Expr {
        self.iter()
            .map(|(_, term)| term.clone())
            .reduce(|acc, term| Expr::Mul(acc.boxed(), term.boxed()))
            .unwrap_or_else(one)
    }
}

impl FromIterator<Expr> for TermSlots {
    fn from_iter<I: IntoIterator<Item = Expr>>(iter: I) -> Self {
        TermSlots {
            slots: iter.into_iter().map(Some).collect(),
        }
    }
}

/// A difference decomposed as `sum(plus) - sum(minus)`.
#[derive(Clone, Debug, Default)]
pub struct SumSplit {
    pub plus: TermSlots,
    pub minus: TermSlots,
}

impl SumSplit {
    pub fn of(expr: &Expr) -> Self {
        let mut split = SumSplit::default();
        split.collect(expr, false);
        split
    }

    fn collect(&mut self, expr: &Expr, negated: bool) {
        match expr {
            Expr::Add(a, b) => {
                self.collect(a, negated);
                self.collect(b, negated);
            }
            Expr::Sub(a, b) => {
                self.collect(a, negated);
                self.collect(b, !negated);
            }
            Expr::Neg(inner) => self.collect(inner, !negated),
            other => {
                let side = if negated { &mut self.minus } else { &mut self.plus };
                side.push(other.clone());
            }
        }
    }

    pub fn term_count(&self) -> usize {
        self.plus.len() + self.minus.len()
    }

    pub fn combine(&self) -> Expr {
        let plus = self.plus.combine_sum();
        if self.minus.is_empty() {
            plus
        } else {
            Expr::Sub(plus.boxed(), self.minus.combine_sum().boxed())
        }
    }
}

/// A quotient decomposed as `product(numer) / product(denom)`.
#[derive(Clone, Debug, Default)]
pub struct ProductSplit {
    pub numer: TermSlots,
    pub denom: TermSlots,
}

impl ProductSplit {
    pub fn of(expr: &Expr) -> Self {
        let mut split = ProductSplit::default();
        split.collect(expr, false);
        split
    }

    fn collect(&mut self, expr: &Expr, inverted: bool) {
        match expr {
            Expr::Mul(a, b) => {
                self.collect(a, inverted);
                self.collect(b, inverted);
            }
            Expr::Div(a, b) => {
                self.collect(a, inverted);
                self.collect(b, !inverted);
            }
            Expr::Pow(base, exp) => match const_exponent(exp) {
                Some(k) if k.is_negative() => {
                    let flipped = Expr::Pow(base.clone(), Expr::Constant(-k).boxed());
                    self.side(!inverted).push(flipped);
                }
                _ => {
                    self.side(inverted).push(expr.clone());
                }
            },
            Expr::Neg(inner) => {
                self.side(inverted).push(Expr::integer(-1));
                self.collect(inner, inverted);
            }
            other => {
                self.side(inverted).push(other.clone());
            }
        }
    }

    fn side(&mut self, inverted: bool) -> &mut TermSlots {
        if inverted {
            &mut self.denom
        } else {
            &mut self.numer
        }
    }

    pub fn combine(&self) -> Expr {
        let numer = self.numer.combine_product();
        if self.denom.is_empty() {
            numer
        } else {
            Expr::Div(numer.boxed(), self.denom.combine_product().boxed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::simplify::equivalent;

    #[test]
    fn holes_keep_indices_stable() {
        let mut slots: TermSlots =
            vec![Expr::var("a"), Expr::var("b"), Expr::var("c")]
                .into_iter()
                .collect();
        let removed = slots.take(1).unwrap();
        assert_eq!(removed, Expr::var("b"));
        assert_eq!(slots.bound(), 3);
        assert_eq!(slots.len(), 2);
        assert!(slots.get(1).is_none());
        assert_eq!(slots.get(2), Some(&Expr::var("c")));
        slots.put(1, removed);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn sum_split_roundtrips_value() {
        let expr = parse_expr("a - b + c - d").unwrap();
        let split = SumSplit::of(&expr);
        assert_eq!(split.plus.len(), 2);
        assert_eq!(split.minus.len(), 2);
        assert!(equivalent(&split.combine(), &expr));
    }

    #[test]
    fn product_split_roundtrips_value() {
        let expr = parse_expr("a*b/(c*d)").unwrap();
        let split = ProductSplit::of(&expr);
        assert_eq!(split.numer.len(), 2);
        assert_eq!(split.denom.len(), 2);
        assert!(equivalent(&split.combine(), &expr));
    }

    #[test]
    fn negative_powers_land_in_the_denominator() {
        let expr = parse_expr("x^-3 * y").unwrap();
        let split = ProductSplit::of(&expr);
        assert_eq!(split.denom.len(), 1);
        assert!(equivalent(&split.combine(), &expr));
    }
}
