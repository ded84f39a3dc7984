//! Aggregate functions.

use quiver_core::DataType;
use serde::{Deserialize, Serialize};

use super::Expr;

/// Aggregate function types.
///
/// Aggregates reduce their input to a single value. Nulls are skipped unless
/// the function counts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AggFunc {
    /// Sum of values
    Sum,
    /// Mean of values
    Mean,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// First value, null included
    First,
    /// Last value, null included
    Last,
    /// Count of non-null values
    Count,
    /// Count of null values
    NullCount,
    /// Count of distinct values, null counted as a value
    NUnique,
    /// Collect all values into a single list
    Implode,
    /// Shannon entropy of the empirical distribution
    Entropy {
        /// Logarithm base; `None` is the natural logarithm.
        base: Option<f64>,
        /// Divide by the log of the number of distinct levels.
        normalize: bool,
    },
}

impl AggFunc {
    /// Get the result type of this aggregate function given the input type.
    ///
    /// Returns `None` if the operation is not valid for the given type.
    pub fn result_type(&self, input: &DataType) -> Option<DataType> {
        match self {
            Self::Count | Self::NullCount | Self::NUnique => Some(DataType::UInt32),

            Self::Sum => match input {
                t if t.is_signed_integer() || *t == DataType::Boolean => Some(DataType::Int64),
                t if t.is_unsigned_integer() => Some(DataType::UInt64),
                DataType::Float32 => Some(DataType::Float32),
                DataType::Float64 | DataType::Null => Some(DataType::Float64),
                DataType::Duration(u) => Some(DataType::Duration(*u)),
                _ => None,
            },

            Self::Mean => match input {
                DataType::Float32 => Some(DataType::Float32),
                t if t.is_numeric() || matches!(t, DataType::Boolean | DataType::Null) => {
                    Some(DataType::Float64)
                }
                _ => None,
            },

            Self::Min | Self::Max => match input {
                DataType::Struct(_) => None,
                t => Some(t.clone()),
            },

            Self::First | Self::Last => Some(input.clone()),

            Self::Implode => Some(DataType::List(Box::new(input.clone()))),

            Self::Entropy { .. } => Some(DataType::Float64),
        }
    }

    /// Get the function name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::NullCount => "null_count",
            Self::NUnique => "n_unique",
            Self::Implode => "implode",
            Self::Entropy { .. } => "entropy",
        }
    }

    /// Check if this aggregate is order-dependent.
    pub const fn is_order_dependent(&self) -> bool {
        matches!(self, Self::First | Self::Last | Self::Implode)
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An aggregate expression with function and input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggExpr {
    /// The aggregate function.
    pub func: AggFunc,
    /// The input expression.
    pub expr: Box<Expr>,
}

impl AggExpr {
    /// Create a new aggregate expression.
    pub fn new(func: AggFunc, expr: Expr) -> Self {
        Self {
            func,
            expr: Box::new(expr),
        }
    }

    /// Get the result type given the input expression type.
    pub fn result_type(&self, input_type: &DataType) -> Option<DataType> {
        self.func.result_type(input_type)
    }
}

impl std::fmt::Display for AggExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}()", self.expr, self.func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agg_result_types() {
        assert_eq!(AggFunc::Sum.result_type(&DataType::Int8), Some(DataType::Int64));
        assert_eq!(AggFunc::Sum.result_type(&DataType::UInt16), Some(DataType::UInt64));
        assert_eq!(AggFunc::Sum.result_type(&DataType::Utf8), None);
        assert_eq!(AggFunc::Mean.result_type(&DataType::Int32), Some(DataType::Float64));
        assert_eq!(AggFunc::Min.result_type(&DataType::Utf8), Some(DataType::Utf8));
        assert_eq!(AggFunc::Count.result_type(&DataType::Utf8), Some(DataType::UInt32));
        assert_eq!(
            AggFunc::Implode.result_type(&DataType::Int8),
            Some(DataType::List(Box::new(DataType::Int8)))
        );
    }

    #[test]
    fn test_order_dependent() {
        assert!(AggFunc::First.is_order_dependent());
        assert!(!AggFunc::Sum.is_order_dependent());
    }
}
