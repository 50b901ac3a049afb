//! Plain-text rendering of expression trees.

use num_traits::{One, Signed};

use crate::expr::{Expr, Rational};

const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_POWER: u8 = 3;
const PREC_ATOM: u8 = 4;

pub fn pretty(expr: &Expr) -> String {
    render(expr, 0)
}

fn render(expr: &Expr, parent_prec: u8) -> String {
    let (text, prec) = match expr {
        Expr::Variable(name) => (name.clone(), PREC_ATOM),
        Expr::Constant(value) => (render_constant(value), constant_prec(value)),
        Expr::Add(a, b) => (
            format!("{} + {}", render(a, PREC_SUM), render(b, PREC_SUM)),
            PREC_SUM,
        ),
        Expr::Sub(a, b) => (
            format!("{} - {}", render(a, PREC_SUM), render(b, PREC_SUM + 1)),
            PREC_SUM,
        ),
        Expr::Mul(a, b) => {
            // -1 * e prints as a prefix minus.
            if let Expr::Constant(c) = &**a {
                if *c == -Rational::one() {
                    let inner = render(b, PREC_PRODUCT);
                    return wrap(format!("-{inner}"), PREC_SUM, parent_prec);
                }
            }
            (
                format!(
                    "{}*{}",
                    render(a, PREC_PRODUCT),
                    render(b, PREC_PRODUCT)
                ),
                PREC_PRODUCT,
            )
        }
        Expr::Div(a, b) => (
            format!(
                "{}/{}",
                render(a, PREC_PRODUCT),
                render(b, PREC_PRODUCT + 1)
            ),
            PREC_PRODUCT,
        ),
        Expr::Pow(a, b) => (
            format!("{}^{}", render(a, PREC_POWER + 1), render(b, PREC_POWER)),
            PREC_POWER,
        ),
        Expr::Neg(inner) => (format!("-{}", render(inner, PREC_PRODUCT)), PREC_SUM),
        Expr::Apply(func, arg) => (
            format!("{}({})", func.name(), render(arg, 0)),
            PREC_ATOM,
        ),
        Expr::Integral(node) => {
            let body = match &node.bounds {
                None => format!("integral({}, {})", render(&node.integrand, 0), node.var),
                Some((lo, hi)) => format!(
                    "integral({}, {}, {}, {})",
                    render(&node.integrand, 0),
                    node.var,
                    render(lo, 0),
                    render(hi, 0)
                ),
            };
            (body, PREC_ATOM)
        }
    };
    wrap(text, prec, parent_prec)
}

fn wrap(text: String, prec: u8, parent_prec: u8) -> String {
    if prec < parent_prec {
        format!("({text})")
    } else {
        text
    }
}

fn render_constant(value: &Rational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

fn constant_prec(value: &Rational) -> u8 {
    if value.is_negative() {
        PREC_SUM
    } else if value.is_integer() {
        PREC_ATOM
    } else {
        PREC_PRODUCT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, mul, pow, Func};

    #[test]
    fn respects_precedence() {
        let expr = mul(
            add(Expr::var("x"), Expr::integer(1)),
            pow(Expr::var("x"), Expr::integer(2)),
        );
        assert_eq!(pretty(&expr), "(x + 1)*x^2");
    }

    #[test]
    fn renders_functions_and_integrals() {
        let inner = Expr::apply(Func::Sin, Expr::var("x"));
        let node = Expr::indefinite_integral(inner, "x");
        assert_eq!(pretty(&node), "integral(sin(x), x)");
    }

    #[test]
    fn negative_unit_coefficient_prints_as_minus() {
        let expr = mul(Expr::integer(-1), Expr::var("x"));
        assert_eq!(pretty(&expr), "-x");
    }
}
