//! Typed column store for Quiver.
//!
//! This crate provides the data model every other crate evaluates against:
//! - `DataType` and `Value` for the type system and numeric promotion
//! - `Column`, a chunked, null-aware Arrow-backed column
//! - `Batch`, an ordered set of equal-length columns
//! - `RowKey`, a hashable tuple of values used for grouping and lookups

pub mod batch;
pub mod column;
pub mod row_key;
pub mod types;

mod proptest_utils;

pub use batch::Batch;
pub use column::{infer_dtype, Column};
pub use row_key::RowKey;
pub use types::{DataType, Field, TimeUnit, Value};
