//! Symbolic calculus: differentiation and the integration tactic engine.

mod differentiate;
pub mod integrate;
pub mod risch;

pub use differentiate::differentiate;
pub use integrate::{
    evaluate_integral, integrate, integrate_expr, CancelToken, IntegrationLimits, Outcome,
};
