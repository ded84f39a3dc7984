//! Quiver - chunked, null-aware columnar expression engine
//!
//! Quiver evaluates lazily built expression trees against batches of typed,
//! chunked columns, with per-group evaluation for groupby aggregations.
//!
//! ```rust
//! use quiver::core::{Batch, Column, Value};
//! use quiver::engine::LocalExecutor;
//! use quiver::logical::expr::{col, lit};
//!
//! let batch = Batch::new(vec![Column::from_iter_values("a", [1i64, 2, 3]).unwrap()]).unwrap();
//! let out = LocalExecutor::default()
//!     .filter(&batch, col("a").gt(lit(1i64)))
//!     .unwrap();
//! assert_eq!(out.column("a").unwrap().get(0).unwrap(), Value::Int64(2));
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use quiver_core as core;
pub use quiver_engine as engine;
pub use quiver_logical as logical;

pub use common_error::{QuiverError, QuiverResult};
pub use quiver_engine::{evaluate, filter, groupby_aggregate, select, with_columns};

/// Quiver version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
