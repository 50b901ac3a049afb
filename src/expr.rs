//! Expression tree definitions and helpers.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

pub type Rational = BigRational;

/// Tag for a unary elementary function application.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Cot,
    Sec,
    Csc,
    Asin,
    Acos,
    Atan,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Log,
    Abs,
    Sgn,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Cot => "cot",
            Func::Sec => "sec",
            Func::Csc => "csc",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Acot => "acot",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Asinh => "asinh",
            Func::Acosh => "acosh",
            Func::Atanh => "atanh",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Abs => "abs",
            Func::Sgn => "sgn",
        }
    }

    pub fn from_name(name: &str) -> Option<Func> {
        let func = match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "cot" => Func::Cot,
            "sec" => Func::Sec,
            "csc" => Func::Csc,
            "asin" | "arcsin" => Func::Asin,
            "acos" | "arccos" => Func::Acos,
            "atan" | "arctan" => Func::Atan,
            "acot" | "arccot" => Func::Acot,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "asinh" | "arsinh" => Func::Asinh,
            "acosh" | "arcosh" => Func::Acosh,
            "atanh" | "artanh" => Func::Atanh,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Log,
            "abs" => Func::Abs,
            "sgn" => Func::Sgn,
            _ => return None,
        };
        Some(func)
    }

    /// f(-x) = -f(x).
    pub fn is_odd(self) -> bool {
        matches!(
            self,
            Func::Sin
                | Func::Tan
                | Func::Cot
                | Func::Csc
                | Func::Asin
                | Func::Atan
                | Func::Sinh
                | Func::Tanh
                | Func::Asinh
                | Func::Atanh
                | Func::Sgn
        )
    }

    /// f(-x) = f(x).
    pub fn is_even(self) -> bool {
        matches!(self, Func::Cos | Func::Sec | Func::Cosh | Func::Abs)
    }
}

/// An integral operator node. `bounds` is `None` for an indefinite
/// integral and `Some((lower, upper))` for a definite one.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct IntegralNode {
    pub integrand: Expr,
    pub var: String,
    pub bounds: Option<(Expr, Expr)>,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Expr {
    Variable(String),
    Constant(Rational),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Apply(Func, Box<Expr>),
    Integral(Box<IntegralNode>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn constant(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::new(num.into(), den.into()))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::from_integer(value.into()))
    }

    pub fn rational(value: Rational) -> Self {
        Expr::Constant(value)
    }

    pub fn apply(func: Func, arg: Expr) -> Self {
        Expr::Apply(func, arg.boxed())
    }

    pub fn indefinite_integral(integrand: Expr, var: impl Into<String>) -> Self {
        Expr::Integral(Box::new(IntegralNode {
            integrand,
            var: var.into(),
            bounds: None,
        }))
    }

    pub fn definite_integral(
        integrand: Expr,
        var: impl Into<String>,
        lower: Expr,
        upper: Expr,
    ) -> Self {
        Expr::Integral(Box::new(IntegralNode {
            integrand,
            var: var.into(),
            bounds: Some((lower, upper)),
        }))
    }

    pub fn negate(self) -> Self {
        match self {
            Expr::Constant(r) => Expr::Constant(-r),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_one())
    }

    pub fn as_variable(&self) -> Option<&str> {
        if let Expr::Variable(name) = self {
            Some(name)
        } else {
            None
        }
    }

    pub fn as_constant(&self) -> Option<&Rational> {
        if let Expr::Constant(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::format::pretty(self))
    }
}

pub fn zero() -> Expr {
    Expr::Constant(Rational::zero())
}

pub fn one() -> Expr {
    Expr::Constant(Rational::one())
}

pub fn rational(num: i64, den: i64) -> Rational {
    Rational::new(num.into(), den.into())
}

pub fn add(a: Expr, b: Expr) -> Expr {
    Expr::Add(a.boxed(), b.boxed())
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    Expr::Sub(a.boxed(), b.boxed())
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(a.boxed(), b.boxed())
}

pub fn div(a: Expr, b: Expr) -> Expr {
    Expr::Div(a.boxed(), b.boxed())
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    Expr::Pow(base.boxed(), exp.boxed())
}

pub fn neg(a: Expr) -> Expr {
    Expr::Neg(a.boxed())
}

pub fn sqrt(a: Expr) -> Expr {
    pow(a, Expr::constant(1, 2))
}

/// Whether `var` occurs free in `expr`. An indefinite integral in `var`
/// counts as depending on `var` (its value varies with the variable); a
/// definite integral binds its integration variable and depends on `var`
/// only through its bounds or through a distinct free variable in the
/// integrand.
pub fn contains_var(expr: &Expr, var: &str) -> bool {
    match expr {
        Expr::Variable(name) => name == var,
        Expr::Constant(_) => false,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            contains_var(a, var) || contains_var(b, var)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => contains_var(inner, var),
        Expr::Integral(node) => match &node.bounds {
            None => node.var == var || contains_var(&node.integrand, var),
            Some((lower, upper)) => {
                contains_var(lower, var)
                    || contains_var(upper, var)
                    || (node.var != var && contains_var(&node.integrand, var))
            }
        },
    }
}

/// Whether any integral operator node occurs in `expr`.
pub fn contains_integral(expr: &Expr) -> bool {
    match expr {
        Expr::Variable(_) | Expr::Constant(_) => false,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            contains_integral(a) || contains_integral(b)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => contains_integral(inner),
        Expr::Integral(_) => true,
    }
}

/// All variable names occurring in `expr`, including bound integration
/// variables.
pub fn variables(expr: &Expr) -> std::collections::BTreeSet<String> {
    fn walk(expr: &Expr, out: &mut std::collections::BTreeSet<String>) {
        match expr {
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Constant(_) => {}
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                walk(a, out);
                walk(b, out);
            }
            Expr::Neg(inner) | Expr::Apply(_, inner) => walk(inner, out),
            Expr::Integral(node) => {
                out.insert(node.var.clone());
                walk(&node.integrand, out);
                if let Some((lo, hi)) = &node.bounds {
                    walk(lo, out);
                    walk(hi, out);
                }
            }
        }
    }
    let mut out = std::collections::BTreeSet::new();
    walk(expr, &mut out);
    out
}

/// Node count, used as a size measure by growth guards.
pub fn expr_size(expr: &Expr) -> usize {
    1 + match expr {
        Expr::Variable(_) | Expr::Constant(_) => 0,
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            expr_size(a) + expr_size(b)
        }
        Expr::Neg(inner) | Expr::Apply(_, inner) => expr_size(inner),
        Expr::Integral(node) => {
            expr_size(&node.integrand)
                + node
                    .bounds
                    .as_ref()
                    .map(|(lo, hi)| expr_size(lo) + expr_size(hi))
                    .unwrap_or(0)
        }
    }
}
