//! Expression layer for Quiver.
//!
//! `quiver-logical` defines the expression tree, the operator and function
//! catalogues, and selector expansion. It has no evaluation logic of its own.
//!
//! # Example
//!
//! ```rust
//! use quiver_logical::expr::{col, lit, RankMethod};
//!
//! let expr = col("score")
//!     .rank(RankMethod::Dense, true)
//!     .filter(col("score").gt(lit(0.5)))
//!     .alias("top");
//! assert_eq!(expr.output_name().as_deref(), Some("top"));
//! println!("{}", expr.explain());
//! ```

pub mod expr;

pub use expr::{
    col, expand_selection, lit, AggExpr, AggFunc, BinaryOp, Expr, FunctionExpr, UnaryOp,
};
