//! Expression system.
//!
//! Expressions are immutable trees built with [`col`], [`lit`] and the builder
//! methods on [`Expr`]. They are evaluated by `quiver-engine`.

mod agg;
mod binary;
#[allow(clippy::module_inception)]
mod expr;
mod func;
mod options;
mod selection;
mod unary;

pub use agg::{AggExpr, AggFunc};
pub use binary::BinaryOp;
pub use expr::{
    all, all_horizontal, any_horizontal, col, cols, cols_by_dtype, cols_regex, concat,
    concat_list, count, element, fold, lit, lit_typed, max_horizontal, min_horizontal, repeat,
    sum_horizontal, Expr,
};
pub use func::{FunctionExpr, HorizontalOp};
pub use options::{
    EwmOptions, NameMapping, RankMethod, RankOptions, SampleOptions, SampleSize,
    SearchSortedSide,
};
pub use selection::{expand_selection, DtypeGroup, Selector};
pub use unary::UnaryOp;
