//! Execution context, random source and the local executor.

mod context;
mod local;
mod random;

pub use context::{EvalContext, ELEMENT_COLUMN};
pub use local::LocalExecutor;
pub use random::RandomSource;
