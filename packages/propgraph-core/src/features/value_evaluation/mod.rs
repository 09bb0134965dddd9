//! Value Evaluation Engine
//!
//! Best-effort symbolic evaluation over the data-flow layer. Given a node,
//! the engine walks DFG edges backwards and tries to resolve a concrete
//! value. Failure to resolve is a normal outcome returned as data
//! ([`EvalResult::CannotEvaluate`]), never an error.
//!
//! Two public variants share one algorithm: [`ValueEvaluator`] insists on a
//! single resolvable value and gives up at control-flow joins;
//! [`MultiValueEvaluator`] unions the values of every join branch and can
//! symbolically unroll counted loops.

pub mod domain;
mod evaluator;

pub use domain::{compute_binary_op, NumberSet, Value};
pub use evaluator::{
    CannotEvaluateHook, EvalCache, EvalResult, MultiValueEvaluator, ValueEvaluator,
};
