//! Exact symbolic integration of single-variable expressions built from
//! rational arithmetic, elementary functions, and algebraic powers. Either a
//! closed-form antiderivative comes back, or the original integral operator
//! does — a wrong "success" is never produced.

pub mod calculus;
pub mod error;
pub mod expr;
pub mod factor;
pub mod format;
pub mod parser;
pub mod polynomial;
pub mod simplify;

pub use calculus::{
    differentiate, evaluate_integral, integrate, integrate_expr, CancelToken, IntegrationLimits,
    Outcome,
};
pub use error::{CasError, Result};
pub use expr::{
    add, contains_integral, contains_var, div, mul, neg, one, pow, rational, sqrt, sub, zero,
    Expr, Func, IntegralNode, Rational,
};
pub use factor::{factor_polynomial, Factor, Factorization};
pub use format::pretty;
pub use parser::parse_expr;
pub use polynomial::Poly;
pub use simplify::{
    equivalent, express_in_terms_of, simplify, simplify_fully, substitute, NotSubstitutable,
};
