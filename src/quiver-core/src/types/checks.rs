//! Type invariant checking.

use common_error::{QuiverError, QuiverResult};

use super::{DataType, Value};

/// Check that a value conforms to the expected dtype without casting.
pub fn check_type_invariants(value: &Value, expected: &DataType) -> QuiverResult<()> {
    match (value, expected) {
        // Null is valid for every dtype.
        (Value::Null, _) => Ok(()),

        (Value::List { values, .. }, DataType::List(inner)) => {
            for (i, elem) in values.iter().enumerate() {
                check_type_invariants(elem, inner).map_err(|e| {
                    QuiverError::dtype_mismatch(format!("list element {i}: {e}"))
                })?;
            }
            Ok(())
        }

        (val, ty) if &val.dtype() == ty => Ok(()),

        (val, ty) => Err(QuiverError::dtype_mismatch(format!(
            "expected {}, got {}",
            ty.display_name(),
            val.dtype().display_name()
        ))),
    }
}

/// Check that a dtype is valid input for a numeric operation.
pub fn check_numeric(data_type: &DataType, op: &str) -> QuiverResult<()> {
    if data_type.is_numeric() || matches!(data_type, DataType::Boolean | DataType::Null) {
        Ok(())
    } else {
        Err(QuiverError::dtype_mismatch(format!(
            "{op} requires a numeric dtype, got {}",
            data_type.display_name()
        )))
    }
}

/// Check that a dtype has a total order usable by sort-based operations.
pub fn check_orderable(data_type: &DataType, op: &str) -> QuiverResult<()> {
    match data_type {
        DataType::Struct(_) => Err(QuiverError::dtype_mismatch(format!(
            "{op} is not defined for {}",
            data_type.display_name()
        ))),
        DataType::List(inner) => check_orderable(inner, op),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_null_matches_any_type() {
        assert!(check_type_invariants(&Value::Null, &DataType::Utf8).is_ok());
    }

    #[test]
    fn test_list_elements_checked() {
        let good = Value::list(DataType::Int64, vec![Value::Int64(1), Value::Null]);
        assert!(check_type_invariants(&good, &DataType::List(Box::new(DataType::Int64))).is_ok());

        let bad = Value::list(DataType::Int64, vec![Value::from("x")]);
        let err = check_type_invariants(&bad, &DataType::List(Box::new(DataType::Int64)))
            .unwrap_err();
        assert!(err.to_string().contains("list element 0"));
    }

    #[test]
    fn test_numeric_and_orderable() {
        assert!(check_numeric(&DataType::UInt8, "sum").is_ok());
        assert!(check_numeric(&DataType::Utf8, "sum").unwrap_err().is_dtype_mismatch());
        assert!(check_orderable(&DataType::Utf8, "rank").is_ok());
        let st = DataType::Struct(vec![Field::new("a", DataType::Int8)]);
        assert!(check_orderable(&st, "rank").is_err());
    }
}
