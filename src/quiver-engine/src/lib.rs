//! Evaluation engine for Quiver.
//!
//! This crate evaluates `quiver-logical` expressions against `quiver-core`
//! batches. It holds the evaluator, the algorithmic primitives behind the
//! built-in functions, and the batch operators.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  Expr           │ ──▶ │  Operator        │ ──▶ │  Batch           │
//! │ (quiver-logical)│     │ (select, filter, │     │ (quiver-core)    │
//! └─────────────────┘     │  group_by)       │     └──────────────────┘
//!                         └──────────────────┘
//!                                 │
//!                                 ▼
//!                         ExprEvaluator + primitives
//! ```
//!
//! # Key Components
//!
//! - [`ExprEvaluator`]: evaluates one expression to a [`Column`]
//! - [`ProjectExec`], [`FilterExec`], [`HashAggregateExec`]: batch operators
//! - [`LocalExecutor`]: owns configuration, random source and worker pool
//!
//! # Example
//!
//! ```rust
//! use quiver_core::{Batch, Column};
//! use quiver_engine::LocalExecutor;
//! use quiver_logical::expr::col;
//!
//! let batch = Batch::new(vec![
//!     Column::from_iter_values("g", ["a", "b", "a"]).unwrap(),
//!     Column::from_iter_values("v", [1i64, 2, 3]).unwrap(),
//! ])
//! .unwrap();
//! let executor = LocalExecutor::default();
//! let out = executor
//!     .group_by(&batch, vec![col("g")], vec![col("v").sum()])
//!     .unwrap();
//! assert_eq!(out.height(), 2);
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)] // Some casts are intentional
#![allow(clippy::needless_pass_by_value)] // Columns are moved into kernels for clarity

pub mod executor;
pub mod expr;
pub mod operators;
mod primitives;

use common_config::{ExecutionConfig, GroupOrdering};
use common_error::QuiverResult;
use quiver_core::{Batch, Column};
use quiver_logical::Expr;

pub use executor::{EvalContext, LocalExecutor, RandomSource, ELEMENT_COLUMN};
pub use expr::{validate_parameters, ExprEvaluator};
pub use operators::{
    BoxedOperator, FilterExec, GroupPartition, HashAggregateExec, Operator, ProjectExec,
};

/// Evaluate one expression against `batch` with `config`.
pub fn evaluate(expr: &Expr, batch: &Batch, config: &ExecutionConfig) -> QuiverResult<Column> {
    LocalExecutor::new(config.clone())?.evaluate(expr, batch)
}

/// Evaluate `exprs` against `batch` and output only their results.
pub fn select(batch: &Batch, exprs: Vec<Expr>, config: &ExecutionConfig) -> QuiverResult<Batch> {
    LocalExecutor::new(config.clone())?.select(batch, exprs)
}

/// Evaluate `exprs` and add or replace them on `batch`.
pub fn with_columns(
    batch: &Batch,
    exprs: Vec<Expr>,
    config: &ExecutionConfig,
) -> QuiverResult<Batch> {
    LocalExecutor::new(config.clone())?.with_columns(batch, exprs)
}

/// Keep the rows of `batch` where `predicate` is true.
pub fn filter(batch: &Batch, predicate: Expr, config: &ExecutionConfig) -> QuiverResult<Batch> {
    LocalExecutor::new(config.clone())?.filter(batch, predicate)
}

/// Group `batch` by `keys` and evaluate `aggs` per group.
pub fn groupby_aggregate(
    batch: &Batch,
    keys: Vec<Expr>,
    aggs: Vec<Expr>,
    ordering: GroupOrdering,
    config: &ExecutionConfig,
) -> QuiverResult<Batch> {
    LocalExecutor::new(config.clone())?.groupby_aggregate(batch, keys, aggs, ordering)
}
