use num_traits::One;

use crate::expr::{one, zero, Expr, Func, Rational};
use crate::simplify::{
    simplify, simplify_add, simplify_div, simplify_mul, simplify_neg, simplify_pow, simplify_sub,
    substitute,
};

pub fn differentiate(var: &str, expr: &Expr) -> Expr {
    Differentiator { var }.derive(expr)
}

struct Differentiator<'a> {
    var: &'a str,
}

impl<'a> Differentiator<'a> {
    fn derive(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Variable(name) if name == self.var => one(),
            Expr::Variable(_) | Expr::Constant(_) => zero(),

            Expr::Add(a, b) => simplify_add(self.derive(a), self.derive(b)),
            Expr::Sub(a, b) => simplify_sub(self.derive(a), self.derive(b)),
            Expr::Mul(a, b) => self.product_rule(a, b),
            Expr::Div(a, b) => self.quotient_rule(a, b),
            Expr::Pow(a, b) => self.power_rule(a, b),
            Expr::Neg(a) => simplify_neg(self.derive(a)),
            Expr::Apply(func, arg) => self.chain_rule(*func, arg),
            Expr::Integral(node) => self.leibniz_rule(node, expr),
        }
    }

    fn product_rule(&self, a: &Expr, b: &Expr) -> Expr {
        simplify_add(
            simplify_mul(self.derive(a), b.clone()),
            simplify_mul(a.clone(), self.derive(b)),
        )
    }

    fn quotient_rule(&self, a: &Expr, b: &Expr) -> Expr {
        simplify_div(
            simplify_sub(
                simplify_mul(self.derive(a), b.clone()),
                simplify_mul(a.clone(), self.derive(b)),
            ),
            simplify_pow(b.clone(), Expr::integer(2)),
        )
    }

    fn power_rule(&self, base: &Expr, exp: &Expr) -> Expr {
        match exp {
            Expr::Constant(n) => simplify_mul(
                simplify_mul(
                    Expr::Constant(n.clone()),
                    simplify_pow(base.clone(), Expr::Constant(n - Rational::one())),
                ),
                self.derive(base),
            ),
            _ => {
                // d(b^g) = b^g * (g' log b + g b'/b)
                let f = simplify_pow(base.clone(), exp.clone());
                let log_part = simplify_mul(
                    self.derive(exp),
                    Expr::apply(Func::Log, base.clone()),
                );
                let base_part = simplify_div(
                    simplify_mul(exp.clone(), self.derive(base)),
                    base.clone(),
                );
                simplify_mul(f, simplify_add(log_part, base_part))
            }
        }
    }

    fn chain_rule(&self, func: Func, arg: &Expr) -> Expr {
        let inner = self.derive(arg);
        if inner.is_zero() {
            return zero();
        }
        let outer = function_derivative(func, arg);
        simplify(simplify_mul(inner, outer))
    }

    fn leibniz_rule(&self, node: &crate::expr::IntegralNode, original: &Expr) -> Expr {
        match &node.bounds {
            None => {
                if node.var == self.var {
                    // Fundamental theorem: the antiderivative's derivative is
                    // the integrand itself.
                    node.integrand.clone()
                } else {
                    Expr::indefinite_integral(
                        self.derive(&node.integrand),
                        node.var.clone(),
                    )
                }
            }
            Some((lower, upper)) => {
                if node.var == self.var {
                    // The integration variable is bound; only the bounds can
                    // carry a dependence.
                    let at_upper = simplify_mul(
                        substitute(&node.integrand, &node.var, upper),
                        self.derive(upper),
                    );
                    let at_lower = simplify_mul(
                        substitute(&node.integrand, &node.var, lower),
                        self.derive(lower),
                    );
                    simplify_sub(at_upper, at_lower)
                } else if crate::expr::contains_var(original, self.var) {
                    let at_upper = simplify_mul(
                        substitute(&node.integrand, &node.var, upper),
                        self.derive(upper),
                    );
                    let at_lower = simplify_mul(
                        substitute(&node.integrand, &node.var, lower),
                        self.derive(lower),
                    );
                    let under_sign = Expr::definite_integral(
                        self.derive(&node.integrand),
                        node.var.clone(),
                        lower.clone(),
                        upper.clone(),
                    );
                    simplify_add(simplify_sub(at_upper, at_lower), under_sign)
                } else {
                    zero()
                }
            }
        }
    }
}

fn function_derivative(func: Func, arg: &Expr) -> Expr {
    let x = arg.clone();
    match func {
        Func::Sin => Expr::apply(Func::Cos, x),
        Func::Cos => simplify_neg(Expr::apply(Func::Sin, x)),
        Func::Tan => reciprocal_square(Func::Cos, x),
        Func::Cot => simplify_neg(reciprocal_square(Func::Sin, x)),
        Func::Sec => simplify_mul(
            Expr::apply(Func::Sec, x.clone()),
            Expr::apply(Func::Tan, x),
        ),
        Func::Csc => simplify_neg(simplify_mul(
            Expr::apply(Func::Csc, x.clone()),
            Expr::apply(Func::Cot, x),
        )),
        Func::Asin => inverse_sqrt_of(one_minus_square(x)),
        Func::Acos => simplify_neg(inverse_sqrt_of(one_minus_square(x))),
        Func::Atan => simplify_div(one(), one_plus_square(x)),
        Func::Acot => simplify_neg(simplify_div(one(), one_plus_square(x))),
        Func::Sinh => Expr::apply(Func::Cosh, x),
        Func::Cosh => Expr::apply(Func::Sinh, x),
        Func::Tanh => reciprocal_square(Func::Cosh, x),
        Func::Asinh => inverse_sqrt_of(one_plus_square(x)),
        Func::Acosh => inverse_sqrt_of(square_minus_one(x)),
        Func::Atanh => simplify_div(one(), one_minus_square(x)),
        Func::Exp => Expr::apply(Func::Exp, x),
        Func::Log => simplify_div(one(), x),
        Func::Abs => Expr::apply(Func::Sgn, x),
        // Zero almost everywhere.
        Func::Sgn => zero(),
    }
}

fn reciprocal_square(func: Func, x: Expr) -> Expr {
    simplify_div(one(), simplify_pow(Expr::apply(func, x), Expr::integer(2)))
}

fn inverse_sqrt_of(expr: Expr) -> Expr {
    simplify_pow(expr, Expr::constant(-1, 2))
}

fn one_minus_square(x: Expr) -> Expr {
    simplify_sub(one(), simplify_pow(x, Expr::integer(2)))
}

fn one_plus_square(x: Expr) -> Expr {
    simplify_add(one(), simplify_pow(x, Expr::integer(2)))
}

fn square_minus_one(x: Expr) -> Expr {
    simplify_sub(simplify_pow(x, Expr::integer(2)), one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::simplify::{equivalent, simplify_fully};

    fn derive(input: &str) -> Expr {
        differentiate("x", &parse_expr(input).unwrap())
    }

    #[test]
    fn differentiates_powers_and_products() {
        assert!(equivalent(&derive("x^3"), &parse_expr("3*x^2").unwrap()));
        assert!(equivalent(
            &derive("x*sin(x)"),
            &parse_expr("sin(x) + x*cos(x)").unwrap()
        ));
    }

    #[test]
    fn differentiates_chains() {
        assert!(equivalent(
            &derive("exp(x^2)"),
            &parse_expr("2*x*exp(x^2)").unwrap()
        ));
        assert!(equivalent(
            &derive("log(x^2 + 1)"),
            &parse_expr("2*x/(x^2 + 1)").unwrap()
        ));
    }

    #[test]
    fn indefinite_integral_derivative_is_the_integrand() {
        let node = Expr::indefinite_integral(parse_expr("exp(x^2)").unwrap(), "x");
        assert_eq!(
            differentiate("x", &node),
            parse_expr("exp(x^2)").unwrap()
        );
    }

    #[test]
    fn definite_integral_with_variable_bound_uses_boundary_term() {
        let node = Expr::definite_integral(
            parse_expr("t^2").unwrap(),
            "t",
            Expr::integer(0),
            Expr::var("x"),
        );
        let derived = differentiate("x", &node);
        assert_eq!(simplify_fully(derived), simplify_fully(parse_expr("x^2").unwrap()));
    }
}
