//! Binary operators.

use quiver_core::DataType;
use serde::{Deserialize, Serialize};

/// Binary operators.
///
/// Every operator except `EqMissing`, `NotEqMissing`, `And` and `Or` returns
/// null when either input is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic operators
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Floor division (//); float inputs divide exactly
    Divide,
    /// True division (/), always float
    TrueDivide,
    /// Modulo (%)
    Modulo,
    /// Power (**)
    Pow,

    // Comparison operators
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// Null-safe equality: two nulls are equal
    EqMissing,
    /// Null-safe inequality
    NotEqMissing,

    // Logical operators (Kleene logic)
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Logical XOR
    Xor,
}

impl BinaryOp {
    /// Check if this is an arithmetic operator.
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Subtract
                | Self::Multiply
                | Self::Divide
                | Self::TrueDivide
                | Self::Modulo
                | Self::Pow
        )
    }

    /// Check if this is a comparison operator.
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::EqMissing
                | Self::NotEqMissing
        )
    }

    /// Check if this is a logical operator.
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor)
    }

    /// Dtype both operands are cast to before the operator runs.
    ///
    /// Returns `None` if the operation is not valid for the given types.
    pub fn operand_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        match self {
            Self::TrueDivide => {
                let common = left.supertype(right)?;
                match common {
                    DataType::Float32 => Some(DataType::Float32),
                    t if t.is_numeric() || t == DataType::Boolean || t == DataType::Null => {
                        Some(DataType::Float64)
                    }
                    _ => None,
                }
            }
            Self::Pow => {
                let common = left.supertype(right)?;
                match common {
                    DataType::Float32 => Some(DataType::Float32),
                    t if t.is_numeric() || t == DataType::Null => Some(DataType::Float64),
                    _ => None,
                }
            }
            Self::And | Self::Or | Self::Xor => {
                let ok = |t: &DataType| matches!(t, DataType::Boolean | DataType::Null);
                (ok(left) && ok(right)).then_some(DataType::Boolean)
            }
            _ if self.is_arithmetic() => {
                let common = left.supertype(right)?;
                (common.is_numeric() || common == DataType::Null).then_some(common)
            }
            _ => left.supertype(right),
        }
    }

    /// Get the result type of this operator given input types.
    ///
    /// Returns `None` if the operation is not valid for the given types.
    pub fn result_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        // Temporal arithmetic is not expressed through the promotion order.
        match (self, left, right) {
            (Self::Subtract, DataType::Datetime(u1, tz1), DataType::Datetime(u2, tz2))
                if tz1 == tz2 =>
            {
                return Some(DataType::Duration((*u1).max(*u2)));
            }
            (Self::Add | Self::Subtract, DataType::Datetime(u, tz), DataType::Duration(_))
            | (Self::Add, DataType::Duration(_), DataType::Datetime(u, tz)) => {
                return Some(DataType::Datetime(*u, tz.clone()));
            }
            (Self::Add | Self::Subtract, DataType::Duration(u1), DataType::Duration(u2)) => {
                return Some(DataType::Duration((*u1).max(*u2)));
            }
            _ => {}
        }
        if self.is_comparison() {
            self.operand_type(left, right).map(|_| DataType::Boolean)
        } else {
            self.operand_type(left, right)
        }
    }

    /// Get the operator symbol for display.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "//",
            Self::TrueDivide => "/",
            Self::Modulo => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::EqMissing => "==(missing)",
            Self::NotEqMissing => "!=(missing)",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
