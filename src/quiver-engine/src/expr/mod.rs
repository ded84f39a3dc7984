//! Expression evaluation.

pub(crate) mod agg;
mod evaluator;
pub(crate) mod kernels;

pub use evaluator::{evaluate, validate_parameters, ExprEvaluator};
