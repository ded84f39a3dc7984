//! Shape and arithmetic helpers: counting, shifting, repeating and concatenation.

use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, UInt32Array};
use common_error::{QuiverError, QuiverResult};
use quiver_core::types::check_numeric;
use quiver_core::{Column, DataType};
use quiver_logical::expr::{AggFunc, BinaryOp};

use crate::expr::agg::aggregate;
use crate::expr::kernels::binary;

/// Row number within `input`, from 0. `reverse` counts from the last row.
pub(crate) fn cumcount(input: &Column, reverse: bool) -> QuiverResult<Column> {
    let len = u32::try_from(input.len())
        .map_err(|_| QuiverError::compute("column too long for cumcount"))?;
    let counts: Vec<u32> = if reverse {
        (0..len).rev().collect()
    } else {
        (0..len).collect()
    };
    Column::from_array(input.name(), Arc::new(UInt32Array::from(counts)))
}

/// Difference with the value `n` rows earlier (later for negative `n`).
pub(crate) fn diff(input: &Column, n: i64) -> QuiverResult<Column> {
    let len = i64::try_from(input.len())
        .map_err(|_| QuiverError::compute("column too long for diff"))?;
    let indices = (0..len)
        .map(|i| {
            match i.checked_sub(n) {
                Some(j) if (0..len).contains(&j) => u32::try_from(j)
                    .map(Some)
                    .map_err(|_| QuiverError::compute("row index exceeds UInt32 range")),
                _ => Ok(None),
            }
        })
        .collect::<QuiverResult<Vec<_>>>()?;
    let shifted = input.take_opt(&indices)?;
    binary(input.clone(), BinaryOp::Subtract, shifted)
}

/// Logarithm in `base`. `Float32` input stays `Float32`.
pub(crate) fn log(input: &Column, base: f64) -> QuiverResult<Column> {
    let dtype = input.dtype();
    check_numeric(dtype, "log")?;
    let ln_base = base.ln();
    let out: Float64Array = input
        .to_f64()?
        .into_iter()
        .map(|v| v.map(|x| x.ln() / ln_base))
        .collect();
    let column = Column::from_array(input.name(), Arc::new(out))?;
    match dtype {
        DataType::Float32 => column.cast(&DataType::Float32),
        _ => Ok(column),
    }
}

/// Sum of the element-wise product.
pub(crate) fn dot(left: Column, right: Column) -> QuiverResult<Column> {
    let product = binary(left, BinaryOp::Multiply, right)?;
    aggregate(AggFunc::Sum, &product)
}

/// Repeat a single value `n` times.
pub(crate) fn repeat(value: &Column, n: usize) -> QuiverResult<Column> {
    if value.len() != 1 {
        return Err(QuiverError::invalid_parameter(format!(
            "repeat expects a single value, got {} rows",
            value.len()
        )));
    }
    value.take(&vec![0; n])
}

/// Rows whose value is present.
pub(crate) fn drop_nulls(input: &Column) -> QuiverResult<Column> {
    if input.null_count() == 0 {
        return Ok(input.clone());
    }
    input.filter(&BooleanArray::from(input.validity()))
}

/// Vertical concatenation of all inputs into one chunk, cast to their supertype.
pub(crate) fn concat(inputs: Vec<Column>) -> QuiverResult<Column> {
    let mut iter = inputs.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| QuiverError::invalid_parameter("concat needs at least one input"))?;
    let rest: Vec<Column> = iter.collect();
    let mut dtype = first.dtype().clone();
    for column in &rest {
        dtype = dtype.supertype(column.dtype()).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!(
                "cannot concatenate {dtype} and {}",
                column.dtype()
            ))
        })?;
    }
    let mut out = first.cast(&dtype)?;
    for column in &rest {
        out = out.append(&column.cast(&dtype)?)?;
    }
    out.rechunk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::Value;

    #[test]
    fn test_cumcount() {
        let col = Column::from_iter_values("a", ["x", "y", "z"]).unwrap();
        let fwd = cumcount(&col, false).unwrap();
        assert_eq!(
            fwd.to_values().unwrap(),
            vec![Value::UInt32(0), Value::UInt32(1), Value::UInt32(2)]
        );
        let rev = cumcount(&col, true).unwrap();
        assert_eq!(rev.get(0).unwrap(), Value::UInt32(2));
    }

    #[test]
    fn test_diff() {
        let col = Column::from_iter_values("a", [1i64, 4, 9]).unwrap();
        assert_eq!(
            diff(&col, 1).unwrap().to_values().unwrap(),
            vec![Value::Null, Value::Int64(3), Value::Int64(5)]
        );
        assert_eq!(
            diff(&col, -1).unwrap().to_values().unwrap(),
            vec![Value::Int64(-3), Value::Int64(-5), Value::Null]
        );
    }

    #[test]
    fn test_diff_shift_beyond_length() {
        let col = Column::from_iter_values("a", [1i64, 4, 9]).unwrap();
        for n in [i64::MIN, i64::MIN + 1, -3, 3, i64::MAX] {
            let out = diff(&col, n).unwrap();
            assert_eq!(out.len(), 3);
            assert_eq!(out.null_count(), 3, "n = {n}");
        }
    }

    #[test]
    fn test_log() {
        let col = Column::from_iter_values("a", [Some(8.0f64), None]).unwrap();
        let out = log(&col, 2.0).unwrap().to_f64().unwrap();
        assert!((out[0].unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(out[1], None);
    }

    #[test]
    fn test_dot() {
        let a = Column::from_iter_values("a", [1i64, 2, 3]).unwrap();
        let b = Column::from_iter_values("b", [1i64, 1, 1]).unwrap();
        let out = dot(a, b).unwrap();
        assert_eq!(out.name(), "a");
        assert_eq!(out.to_values().unwrap(), vec![Value::Int64(6)]);
    }

    #[test]
    fn test_repeat_and_drop_nulls() {
        let one = Column::full_null("n", DataType::Int64, 1);
        let repeated = repeat(&one, 3).unwrap();
        assert_eq!(repeated.len(), 3);
        assert_eq!(drop_nulls(&repeated).unwrap().len(), 0);
    }

    #[test]
    fn test_concat_single_chunk() {
        let a = Column::full_null("a", DataType::Null, 2);
        let b = Column::from_iter_values("b", [1i64, 2]).unwrap();
        let out = concat(vec![a, b]).unwrap();
        assert_eq!(out.n_chunks(), 1);
        assert_eq!(*out.dtype(), DataType::Int64);
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::Null, Value::Null, Value::Int64(1), Value::Int64(2)]
        );
    }
}
