//! Symbolic simplification, substitution, and equivalence utilities.

mod equivalence;
mod rules;
mod substitute;

pub use equivalence::{equivalent, eval};
pub use rules::{
    simplify, simplify_add, simplify_div, simplify_fully, simplify_mul, simplify_neg,
    simplify_pow, simplify_sub, simplify_with_limit,
};
pub use substitute::{
    express_in_terms_of, replace_subexpr, substitute, NotSubstitutable,
};
