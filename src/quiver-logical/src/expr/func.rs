//! Function expressions.
//!
//! A function node applies one of the built-in operations below to its argument
//! expressions. Unless noted, the first argument is the input column.

use quiver_core::Value;
use serde::{Deserialize, Serialize};

use super::options::{EwmOptions, RankOptions, SampleOptions, SearchSortedSide};
use super::Expr;

/// Horizontal (row-wise) reducers over several inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalOp {
    /// Row-wise minimum.
    Min,
    /// Row-wise maximum.
    Max,
    /// Row-wise sum.
    Sum,
    /// Row-wise logical OR.
    Any,
    /// Row-wise logical AND.
    All,
}

impl HorizontalOp {
    /// Function name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Min => "min_horizontal",
            Self::Max => "max_horizontal",
            Self::Sum => "sum_horizontal",
            Self::Any => "any_horizontal",
            Self::All => "all_horizontal",
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionExpr {
    /// Rank of each value among the non-null values.
    Rank(RankOptions),
    /// Distinct values; `stable` keeps first-occurrence order, otherwise sorted.
    Unique {
        /// Keep first-occurrence order.
        stable: bool,
    },
    /// Occurrence count of each distinct value, in first-occurrence order.
    UniqueCounts,
    /// Insertion index of each query (second argument) in the sorted first argument.
    SearchSorted {
        /// Insertion side for equal elements.
        side: SearchSortedSide,
    },
    /// Row number within the input, starting at 0.
    CumCount {
        /// Count from the end.
        reverse: bool,
    },
    /// Exponentially weighted moving mean.
    EwmMean(EwmOptions),
    /// Exponentially weighted moving standard deviation.
    EwmStd(EwmOptions),
    /// Exponentially weighted moving variance.
    EwmVar(EwmOptions),
    /// Remap values through `mapping`; an optional second argument supplies
    /// values for unmapped rows.
    MapDict {
        /// Ordered `(from, to)` pairs. A `Null` key maps source nulls.
        mapping: Vec<(Value, Value)>,
    },
    /// Seeded random row selection.
    Sample(SampleOptions),
    /// Seeded random permutation.
    Shuffle {
        /// Fixed seed; `None` draws from the context's random source.
        seed: Option<u64>,
    },
    /// Drop null rows.
    DropNulls,
    /// Reverse row order.
    Reverse,
    /// Coalesce chunks into one.
    Rechunk,
    /// Append the second argument's chunks after the first.
    Append,
    /// Concatenate all arguments vertically into a single chunk.
    Concat,
    /// Row-wise concatenation of all arguments into a list.
    ConcatList,
    /// Repeat the (scalar) argument `n` times.
    Repeat {
        /// Number of repetitions.
        n: usize,
    },
    /// Difference with the value `n` rows earlier.
    Diff {
        /// Lag.
        n: i64,
    },
    /// Logarithm.
    Log {
        /// Logarithm base.
        base: f64,
    },
    /// Dot product of the two arguments.
    Dot,
    /// Reducer over all arguments, skipping nulls per row.
    Horizontal(HorizontalOp),
    /// Evaluate `expr` against each list cell; the cell is bound to `element()`.
    ListEval {
        /// Expression evaluated per cell.
        expr: Box<Expr>,
        /// Evaluate cells on worker threads.
        parallel: bool,
    },
    /// Join the strings of each list cell.
    ListJoin {
        /// Separator placed between items.
        separator: String,
    },
    /// Whether each list cell contains the second argument.
    ListContains,
}

impl FunctionExpr {
    /// Function name for display and default naming.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rank(_) => "rank",
            Self::Unique { .. } => "unique",
            Self::UniqueCounts => "unique_counts",
            Self::SearchSorted { .. } => "search_sorted",
            Self::CumCount { .. } => "cumcount",
            Self::EwmMean(_) => "ewm_mean",
            Self::EwmStd(_) => "ewm_std",
            Self::EwmVar(_) => "ewm_var",
            Self::MapDict { .. } => "map_dict",
            Self::Sample(_) => "sample",
            Self::Shuffle { .. } => "shuffle",
            Self::DropNulls => "drop_nulls",
            Self::Reverse => "reverse",
            Self::Rechunk => "rechunk",
            Self::Append => "append",
            Self::Concat => "concat",
            Self::ConcatList => "concat_list",
            Self::Repeat { .. } => "repeat",
            Self::Diff { .. } => "diff",
            Self::Log { .. } => "log",
            Self::Dot => "dot",
            Self::Horizontal(op) => op.name(),
            Self::ListEval { .. } => "list_eval",
            Self::ListJoin { .. } => "list_join",
            Self::ListContains => "list_contains",
        }
    }

    /// Whether the function reduces its input to a single value.
    pub const fn returns_scalar(&self) -> bool {
        matches!(self, Self::Dot)
    }

    /// Whether the output has the same length as the input.
    pub const fn is_elementwise(&self) -> bool {
        matches!(
            self,
            Self::Rank(_)
                | Self::CumCount { .. }
                | Self::EwmMean(_)
                | Self::EwmStd(_)
                | Self::EwmVar(_)
                | Self::MapDict { .. }
                | Self::Shuffle { .. }
                | Self::Reverse
                | Self::Rechunk
                | Self::Diff { .. }
                | Self::Log { .. }
                | Self::Horizontal(_)
                | Self::ListEval { .. }
                | Self::ListJoin { .. }
                | Self::ListContains
                | Self::ConcatList
                | Self::SearchSorted { .. }
        )
    }

    /// Whether the function draws random numbers.
    pub const fn is_random(&self) -> bool {
        matches!(self, Self::Sample(_) | Self::Shuffle { .. })
    }

    /// Parameters shown by `explain`.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Rank(opts) => Some(format!(
                "method={}, descending={}",
                opts.method.name(),
                opts.descending
            )),
            Self::Unique { stable } => Some(format!("stable={stable}")),
            Self::SearchSorted { side } => Some(format!("side={side:?}")),
            Self::CumCount { reverse } => Some(format!("reverse={reverse}")),
            Self::EwmMean(opts) | Self::EwmStd(opts) | Self::EwmVar(opts) => Some(format!(
                "alpha={}, adjust={}",
                opts.alpha, opts.adjust
            )),
            Self::MapDict { mapping } => Some(format!("{} entries", mapping.len())),
            Self::Sample(opts) => Some(format!("{:?}, seed={:?}", opts.size, opts.seed)),
            Self::Shuffle { seed } => Some(format!("seed={seed:?}")),
            Self::Repeat { n } => Some(format!("n={n}")),
            Self::Diff { n } => Some(format!("n={n}")),
            Self::Log { base } => Some(format!("base={base}")),
            Self::ListEval { expr, parallel } => Some(format!("{expr}, parallel={parallel}")),
            Self::ListJoin { separator } => Some(format!("separator={separator:?}")),
            _ => None,
        }
    }
}

impl std::fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, RankMethod};

    #[test]
    fn test_function_names() {
        assert_eq!(FunctionExpr::UniqueCounts.name(), "unique_counts");
        assert_eq!(FunctionExpr::Horizontal(HorizontalOp::Max).name(), "max_horizontal");
        assert!(FunctionExpr::Dot.returns_scalar());
        assert!(FunctionExpr::Shuffle { seed: None }.is_random());
    }

    #[test]
    fn test_details() {
        let rank = FunctionExpr::Rank(RankOptions {
            method: RankMethod::Dense,
            descending: false,
        });
        assert_eq!(rank.details().unwrap(), "method=dense, descending=false");

        let eval = FunctionExpr::ListEval {
            expr: Box::new(col("").rank(RankMethod::Average, false)),
            parallel: true,
        };
        assert!(eval.details().unwrap().ends_with("parallel=true"));
    }
}
