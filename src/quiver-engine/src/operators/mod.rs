//! Batch operators.
//!
//! | Operator | Output height |
//! |----------|---------------|
//! | `ProjectExec` (select) | common length of the outputs |
//! | `ProjectExec` (with_columns) | input height |
//! | `FilterExec` | rows where the predicate is true |
//! | `HashAggregateExec` | one row per group |

mod aggregate;
mod filter;
mod project;
mod traits;

pub use traits::{BoxedOperator, Operator};

pub use aggregate::{GroupPartition, HashAggregateExec};
pub use filter::FilterExec;
pub use project::ProjectExec;
