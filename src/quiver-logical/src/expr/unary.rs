//! Unary operators.

use quiver_core::DataType;
use serde::{Deserialize, Serialize};

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Numeric negation.
    Neg,
    /// Is null check.
    IsNull,
    /// Is not null check.
    IsNotNull,
    /// Absolute value.
    Abs,
}

impl UnaryOp {
    /// Get the result type given the operand type.
    pub fn result_type(&self, input: &DataType) -> Option<DataType> {
        match self {
            Self::Not => matches!(input, DataType::Boolean | DataType::Null)
                .then_some(DataType::Boolean),
            Self::IsNull | Self::IsNotNull => Some(DataType::Boolean),
            Self::Neg | Self::Abs => (input.is_numeric()
                || matches!(input, DataType::Duration(_) | DataType::Null))
            .then(|| input.clone()),
        }
    }

    /// Name used in display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Neg => "neg",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Abs => "abs",
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_result_types() {
        assert_eq!(UnaryOp::Not.result_type(&DataType::Boolean), Some(DataType::Boolean));
        assert_eq!(UnaryOp::Not.result_type(&DataType::Int8), None);
        assert_eq!(UnaryOp::Abs.result_type(&DataType::Int8), Some(DataType::Int8));
        assert_eq!(UnaryOp::IsNull.result_type(&DataType::Utf8), Some(DataType::Boolean));
        assert_eq!(UnaryOp::Neg.result_type(&DataType::Utf8), None);
    }
}
