//! Operator trait.

use std::fmt::Debug;

use common_error::QuiverResult;
use quiver_core::Batch;

use crate::executor::EvalContext;

/// A batch-to-batch operator.
///
/// Operators read the batch bound in the context and produce a new batch. They
/// never mutate their input; every evaluation is synchronous and
/// self-contained.
pub trait Operator: Send + Sync + Debug {
    /// Operator name for display and logging.
    fn name(&self) -> &'static str;

    /// Run the operator over `ctx.batch()`.
    fn execute(&self, ctx: &EvalContext<'_>) -> QuiverResult<Batch>;
}

/// Boxed operator.
pub type BoxedOperator = Box<dyn Operator>;
