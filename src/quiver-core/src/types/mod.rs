//! Type system for Quiver values.
//!
//! `DataType` is the closed set of column dtypes and carries the numeric
//! promotion order; `Value` is the matching nullable scalar.

mod checks;
mod data_type;
mod value;

pub use checks::{check_numeric, check_orderable, check_type_invariants};
pub use data_type::{DataType, Field, TimeUnit};
pub use value::Value;
