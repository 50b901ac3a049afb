use icas::{Poly, Rational};
use proptest::prelude::*;

fn small_coeff() -> impl Strategy<Value = Rational> {
    (-50i64..50i64).prop_map(|n| Rational::from_integer(n.into()))
}

fn small_poly() -> impl Strategy<Value = Poly> {
    proptest::collection::vec(small_coeff(), 1..=5).prop_map(Poly::new)
}

fn nonzero_poly() -> impl Strategy<Value = Poly> {
    small_poly().prop_filter("polynomial must be non-zero", |p| !p.is_zero())
}

proptest! {
    #[test]
    fn addition_commutes(a in small_poly(), b in small_poly()) {
        prop_assert_eq!(a.clone() + b.clone(), b + a);
    }

    #[test]
    fn multiplication_distributes(a in small_poly(), b in small_poly(), c in small_poly()) {
        let left = a.clone() * (b.clone() + c.clone());
        let right = a.clone() * b + a * c;
        prop_assert_eq!(left, right);
    }

    #[test]
    fn division_reconstructs(a in small_poly(), b in nonzero_poly()) {
        let (q, r) = a.div_rem(&b);
        prop_assert!(r.is_zero() || r.degree() < b.degree());
        prop_assert_eq!(q * b + r, a);
    }

    #[test]
    fn gcd_divides_both(a in nonzero_poly(), b in nonzero_poly()) {
        let g = Poly::gcd(&a, &b);
        prop_assert!(!g.is_zero());
        prop_assert!(a.div_exact(&g).is_some());
        prop_assert!(b.div_exact(&g).is_some());
    }

    #[test]
    fn antiderivative_inverts_derivative(p in small_poly()) {
        prop_assert_eq!(p.antiderivative().derivative(), p);
    }
}
