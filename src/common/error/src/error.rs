//! Core error types for Quiver.

use thiserror::Error;

/// Result type alias using `QuiverError`.
pub type QuiverResult<T> = std::result::Result<T, QuiverError>;

/// Error type for column construction and expression evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuiverError {
    /// An expression referenced a column name that is not bound in the context.
    #[error("UnresolvedColumn: '{name}' not found; available columns: {available:?}")]
    UnresolvedColumn {
        /// The requested name.
        name: String,
        /// Names that were available at resolution time.
        available: Vec<String>,
    },

    /// Sibling operands had lengths that cannot be broadcast together.
    #[error("LengthMismatch: {context}: lengths {left} and {right} cannot be broadcast")]
    LengthMismatch {
        /// Where the mismatch was found.
        context: String,
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },

    /// Operation undefined for the given dtype(s).
    #[error("DtypeMismatch: {0}")]
    DtypeMismatch(String),

    /// Invalid parameter provided, detected before evaluation starts.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// A compute kernel failed.
    #[error("ComputeError: {0}")]
    ComputeError(String),

    /// Feature not yet implemented.
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// Internal error (bug in Quiver).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl QuiverError {
    /// Create a new `UnresolvedColumn` error.
    pub fn unresolved_column<S: Into<String>>(name: S, available: Vec<String>) -> Self {
        Self::UnresolvedColumn {
            name: name.into(),
            available,
        }
    }

    /// Create a new `LengthMismatch` error.
    pub fn length_mismatch<S: Into<String>>(context: S, left: usize, right: usize) -> Self {
        Self::LengthMismatch {
            context: context.into(),
            left,
            right,
        }
    }

    /// Create a new `DtypeMismatch` error.
    pub fn dtype_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::DtypeMismatch(msg.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new `ComputeError`.
    pub fn compute<S: Into<String>>(msg: S) -> Self {
        Self::ComputeError(msg.into())
    }

    /// Create a new `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Map a failed Arrow kernel call into a `ComputeError`.
    pub fn from_kernel(op: &str, err: arrow_schema::ArrowError) -> Self {
        Self::ComputeError(format!("{op}: {err}"))
    }

    /// Whether this is an `UnresolvedColumn` error.
    pub const fn is_unresolved_column(&self) -> bool {
        matches!(self, Self::UnresolvedColumn { .. })
    }

    /// Whether this is a `LengthMismatch` error.
    pub const fn is_length_mismatch(&self) -> bool {
        matches!(self, Self::LengthMismatch { .. })
    }

    /// Whether this is a `DtypeMismatch` error.
    pub const fn is_dtype_mismatch(&self) -> bool {
        matches!(self, Self::DtypeMismatch(_))
    }

    /// Whether this is an `InvalidParameter` error.
    pub const fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }
}

/// Ensure a condition holds, returning a `ComputeError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::QuiverError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::QuiverError::ComputeError($msg.to_string()));
        }
    };
}

/// Return early with a `DtypeMismatch`.
#[macro_export]
macro_rules! dtype_err {
    ($($arg:tt)*) => {
        return Err($crate::QuiverError::DtypeMismatch(format!($($arg)*)))
    };
}

/// Return early with an `InvalidParameter`.
#[macro_export]
macro_rules! param_err {
    ($($arg:tt)*) => {
        return Err($crate::QuiverError::InvalidParameter(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(n: i64) -> QuiverResult<i64> {
        ensure!(n >= 0, InvalidParameter: "n must be non-negative, got {n}");
        Ok(n)
    }

    fn typed(flag: bool) -> QuiverResult<()> {
        if flag {
            dtype_err!("cannot add {} and {}", "Utf8", "Int64");
        }
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = QuiverError::dtype_mismatch("expected Int64, got Utf8");
        assert_eq!(err.to_string(), "DtypeMismatch: expected Int64, got Utf8");

        let err = QuiverError::length_mismatch("add", 3, 4);
        assert_eq!(
            err.to_string(),
            "LengthMismatch: add: lengths 3 and 4 cannot be broadcast"
        );
    }

    #[test]
    fn test_unresolved_column_lists_available() {
        let err = QuiverError::unresolved_column("z", vec!["a".to_string(), "b".to_string()]);
        assert!(err.is_unresolved_column());
        assert!(err.to_string().contains("'z'"));
        assert!(err.to_string().contains("\"a\""));
    }

    #[test]
    fn test_macros() {
        assert_eq!(checked(3).unwrap(), 3);
        assert!(checked(-1).unwrap_err().is_invalid_parameter());
        assert!(typed(true).unwrap_err().is_dtype_mismatch());
        assert!(typed(false).is_ok());
    }
}
