//! The integration tactic engine: an ordered library of pattern-matching
//! rewrite tactics tried with early exit, recursively re-entered by the
//! tactics themselves on reduced sub-problems.

mod cancel;
pub(crate) mod common;
mod definite;
mod limits;
mod linearity;
mod normalize;
mod parts;
mod patterns;
mod power;
mod rational;
mod substitution;
mod table;
pub(crate) mod terms;

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::expr::{contains_var, mul, Expr, IntegralNode};
use crate::simplify::{simplify, simplify_fully, substitute};

pub use cancel::CancelToken;
pub use limits::IntegrationLimits;
pub use terms::{ProductSplit, SumSplit, TermSlots};

/// What a tactic (and the whole dispatch) produced. Genuine computation
/// failures travel separately as errors; `NotFound` is the expected,
/// frequent "try the next tactic" signal and never an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Found(Expr),
    NotFound,
}

const MAX_DISPATCH_DEPTH: usize = 64;

/// Shared state for one top-level integration call. Derived contexts (for a
/// substituted variable) share the recursion guards.
pub(crate) struct Context<'a> {
    pub(crate) var: String,
    pub(crate) limits: &'a IntegrationLimits,
    pub(crate) cancel: &'a CancelToken,
    exp_normalized: bool,
    depth: Rc<Cell<usize>>,
    active: Rc<RefCell<HashSet<Expr>>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        var: String,
        limits: &'a IntegrationLimits,
        cancel: &'a CancelToken,
    ) -> Self {
        Context {
            var,
            limits,
            cancel,
            exp_normalized: false,
            depth: Rc::new(Cell::new(0)),
            active: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub(crate) fn with_var(&self, var: String) -> Context<'a> {
        Context {
            var,
            limits: self.limits,
            cancel: self.cancel,
            exp_normalized: false,
            depth: Rc::clone(&self.depth),
            active: Rc::clone(&self.active),
        }
    }

    fn with_exp_normalized(&self) -> Context<'a> {
        Context {
            var: self.var.clone(),
            limits: self.limits,
            cancel: self.cancel,
            exp_normalized: true,
            depth: Rc::clone(&self.depth),
            active: Rc::clone(&self.active),
        }
    }
}

type Tactic = for<'a, 'b> fn(&'a Context<'b>, &'a Expr) -> Result<Outcome>;

/// Tactic order is fixed: cheap structural rules first, the combinatorial
/// searches last.
const TACTICS: &[(&str, Tactic)] = &[
    ("linearity", linearity::split_sum),
    ("constant-factor", linearity::pull_constant_factors),
    ("monomial", table::monomial),
    ("elementary", table::elementary),
    ("power-reduction", power::reduce),
    ("log-derivative", substitution::log_derivative),
    ("substitution", substitution::search),
    ("rational", rational::integrate_rational),
    ("special-patterns", patterns::special_patterns),
    ("partial-integration", parts::integrate_by_parts),
    ("exponential-tower", crate::calculus::risch::exponential_tower),
];

/// Integrate one integral operator node. Definite integrals evaluate their
/// bounds over the indefinite result; an unresolved integral reports
/// `NotFound`, which callers surface as the original operator, unevaluated.
pub fn integrate(
    node: &IntegralNode,
    limits: &IntegrationLimits,
    cancel: &CancelToken,
) -> Result<Outcome> {
    match &node.bounds {
        Some(_) => definite::evaluate(node, limits, cancel),
        None => {
            let ctx = Context::new(node.var.clone(), limits, cancel);
            dispatch(&ctx, &node.integrand)
        }
    }
}

/// Indefinite integration of a bare integrand.
pub fn integrate_expr(
    var: &str,
    expr: &Expr,
    limits: &IntegrationLimits,
    cancel: &CancelToken,
) -> Result<Outcome> {
    let ctx = Context::new(var.to_string(), limits, cancel);
    dispatch(&ctx, expr)
}

/// Like [`integrate`], but an unresolved integral comes back as the original
/// operator node instead of a separate signal.
pub fn evaluate_integral(
    node: &IntegralNode,
    limits: &IntegrationLimits,
    cancel: &CancelToken,
) -> Result<Expr> {
    match integrate(node, limits, cancel)? {
        Outcome::Found(result) => Ok(result),
        Outcome::NotFound => Ok(Expr::Integral(Box::new(node.clone()))),
    }
}

pub(crate) fn dispatch(ctx: &Context, integrand: &Expr) -> Result<Outcome> {
    ctx.cancel.check()?;
    let simplified = simplify_fully(integrand.clone());
    if !contains_var(&simplified, &ctx.var) {
        return Ok(Outcome::Found(simplify(mul(
            simplified,
            Expr::var(&ctx.var),
        ))));
    }
    let prepared = normalize::combine_polynomial_factors(
        &simplified,
        &ctx.var,
        ctx.limits.max_degree,
    );

    // Re-entry guard: the same sub-problem (up to variable renaming) higher
    // in the active chain means a tactic cycle, not progress.
    let key = substitute(&prepared, &ctx.var, &Expr::var("#"));
    if ctx.depth.get() >= MAX_DISPATCH_DEPTH || !ctx.active.borrow_mut().insert(key.clone()) {
        return Ok(Outcome::NotFound);
    }
    ctx.depth.set(ctx.depth.get() + 1);
    let result = run_tactics(ctx, &prepared);
    ctx.depth.set(ctx.depth.get() - 1);
    ctx.active.borrow_mut().remove(&key);
    result
}

fn run_tactics(ctx: &Context, integrand: &Expr) -> Result<Outcome> {
    for (name, tactic) in TACTICS {
        if let Outcome::Found(result) = tactic(ctx, integrand)? {
            debug!(tactic = *name, var = %ctx.var, "tactic matched");
            return Ok(Outcome::Found(simplify_fully(result)));
        }
    }
    // Last resort: canonicalize exponentials and retry once if that changed
    // anything.
    if !ctx.exp_normalized {
        let rewritten = normalize::multiply_out(integrand, &ctx.var);
        if rewritten != *integrand {
            debug!(var = %ctx.var, "retrying with normalized exponentials");
            return dispatch(&ctx.with_exp_normalized(), &rewritten);
        }
    }
    Ok(Outcome::NotFound)
}

/// Dispatch a sub-integrand, keeping it as an unevaluated integral operator
/// if no tactic resolves it.
pub(crate) fn integrate_or_residual(ctx: &Context, integrand: &Expr) -> Result<Expr> {
    match dispatch(ctx, integrand)? {
        Outcome::Found(result) => Ok(result),
        Outcome::NotFound => Ok(Expr::indefinite_integral(
            integrand.clone(),
            ctx.var.clone(),
        )),
    }
}
