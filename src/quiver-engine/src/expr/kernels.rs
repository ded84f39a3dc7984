//! Scalar and null semantics for binary and unary operators.
//!
//! Operands are broadcast, cast to the operator's operand dtype, and handed to
//! an Arrow kernel where one exists with the right semantics. Floor division,
//! modulo, power, xor, abs and temporal arithmetic are computed value by value.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Datum, Float64Array};
use arrow::compute::kernels::{boolean, cmp, numeric, zip::zip};
use arrow::error::ArrowError;
use common_error::{QuiverError, QuiverResult};
use quiver_core::{Column, DataType, TimeUnit, Value};
use quiver_logical::expr::{BinaryOp, UnaryOp};

type ArithKernel = fn(&dyn Datum, &dyn Datum) -> Result<ArrayRef, ArrowError>;
type CmpKernel = fn(&dyn Datum, &dyn Datum) -> Result<BooleanArray, ArrowError>;

// ============================================================================
// Broadcasting
// ============================================================================

/// Broadcast a length-1 side to the other side's length.
pub(crate) fn broadcast_pair(
    left: Column,
    right: Column,
    context: &str,
) -> QuiverResult<(Column, Column)> {
    match (left.len(), right.len()) {
        (l, r) if l == r => Ok((left, right)),
        (1, r) => Ok((left.broadcast(r)?, right)),
        (l, 1) => {
            let right = right.broadcast(l)?;
            Ok((left, right))
        }
        (l, r) => Err(QuiverError::length_mismatch(context, l, r)),
    }
}

/// Broadcast every length-1 column to the common length of the others.
pub(crate) fn broadcast_all(columns: Vec<Column>, context: &str) -> QuiverResult<Vec<Column>> {
    let target = columns
        .iter()
        .map(Column::len)
        .find(|&len| len != 1)
        .unwrap_or(1);
    columns
        .into_iter()
        .map(|c| match c.len() {
            len if len == target => Ok(c),
            1 => c.broadcast(target),
            len => Err(QuiverError::length_mismatch(context, target, len)),
        })
        .collect()
}

// ============================================================================
// Binary operators
// ============================================================================

/// Evaluate `left op right`. The result keeps the left operand's name.
pub(crate) fn binary(left: Column, op: BinaryOp, right: Column) -> QuiverResult<Column> {
    let name = left.name().to_string();
    let (left, right) = broadcast_pair(left, right, &format!("operation '{op}'"))?;
    let out_dtype = op.result_type(left.dtype(), right.dtype()).ok_or_else(|| {
        QuiverError::dtype_mismatch(format!(
            "operation '{op}' is not defined for {} and {}",
            left.dtype(),
            right.dtype()
        ))
    })?;

    if is_temporal_arithmetic(op, left.dtype(), right.dtype()) {
        return temporal_arithmetic(&name, &left, op, &right, &out_dtype);
    }

    let operand = op.operand_type(left.dtype(), right.dtype()).ok_or_else(|| {
        QuiverError::dtype_mismatch(format!(
            "no common dtype for {} and {} in '{op}'",
            left.dtype(),
            right.dtype()
        ))
    })?;
    let l = left.cast(&operand)?;
    let r = right.cast(&operand)?;
    if operand == DataType::Null {
        return null_operands(&name, op, l.len(), &out_dtype);
    }

    let result = match op {
        BinaryOp::Add => arith(&l, &r, numeric::add, "add")?,
        BinaryOp::Subtract => arith(&l, &r, numeric::sub, "subtract")?,
        BinaryOp::Multiply => arith(&l, &r, numeric::mul, "multiply")?,
        BinaryOp::TrueDivide => arith(&l, &r, numeric::div, "divide")?,
        BinaryOp::Divide if operand.is_float() => arith(&l, &r, numeric::div, "divide")?,
        BinaryOp::Divide => int_binary(&l, &r, &operand, floor_div)?,
        BinaryOp::Modulo if operand.is_float() => float_binary(&l, &r, &operand, float_mod)?,
        BinaryOp::Modulo => int_binary(&l, &r, &operand, floor_mod)?,
        BinaryOp::Pow => float_binary(&l, &r, &operand, f64::powf)?,
        op if op.is_comparison() && operand.is_nested() => nested_compare(&l, op, &r)?,
        BinaryOp::Eq => compare(&l, &r, cmp::eq, "eq")?,
        BinaryOp::NotEq => compare(&l, &r, cmp::neq, "neq")?,
        BinaryOp::Lt => compare(&l, &r, cmp::lt, "lt")?,
        BinaryOp::LtEq => compare(&l, &r, cmp::lt_eq, "lt_eq")?,
        BinaryOp::Gt => compare(&l, &r, cmp::gt, "gt")?,
        BinaryOp::GtEq => compare(&l, &r, cmp::gt_eq, "gt_eq")?,
        BinaryOp::EqMissing => compare(&l, &r, cmp::not_distinct, "eq_missing")?,
        BinaryOp::NotEqMissing => compare(&l, &r, cmp::distinct, "neq_missing")?,
        BinaryOp::And => {
            let out = boolean::and_kleene(&to_boolean(&l, "and")?, &to_boolean(&r, "and")?)
                .map_err(|e| QuiverError::from_kernel("and", e))?;
            Column::from_array(&name, Arc::new(out))?
        }
        BinaryOp::Or => {
            let out = boolean::or_kleene(&to_boolean(&l, "or")?, &to_boolean(&r, "or")?)
                .map_err(|e| QuiverError::from_kernel("or", e))?;
            Column::from_array(&name, Arc::new(out))?
        }
        BinaryOp::Xor => {
            let (a, b) = (to_boolean(&l, "xor")?, to_boolean(&r, "xor")?);
            let out: BooleanArray = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| Some(x? ^ y?))
                .collect();
            Column::from_array(&name, Arc::new(out))?
        }
    };
    Ok(result.rename(name))
}

fn null_operands(
    name: &str,
    op: BinaryOp,
    len: usize,
    out_dtype: &DataType,
) -> QuiverResult<Column> {
    match op {
        BinaryOp::EqMissing | BinaryOp::NotEqMissing => {
            let out = BooleanArray::from(vec![op == BinaryOp::EqMissing; len]);
            Column::from_array(name, Arc::new(out))
        }
        _ => Ok(Column::full_null(name, out_dtype.clone(), len)),
    }
}

fn arith(l: &Column, r: &Column, kernel: ArithKernel, name: &str) -> QuiverResult<Column> {
    let out = kernel(&l.as_array()?, &r.as_array()?)
        .map_err(|e| QuiverError::from_kernel(name, e))?;
    Column::from_array(l.name(), out)
}

fn compare(l: &Column, r: &Column, kernel: CmpKernel, name: &str) -> QuiverResult<Column> {
    let out = kernel(&l.as_array()?, &r.as_array()?)
        .map_err(|e| QuiverError::from_kernel(name, e))?;
    Column::from_array(l.name(), Arc::new(out))
}

fn nested_compare(l: &Column, op: BinaryOp, r: &Column) -> QuiverResult<Column> {
    let (lv, rv) = (l.to_values()?, r.to_values()?);
    let out: BooleanArray = lv
        .iter()
        .zip(&rv)
        .map(|(a, b)| match op {
            BinaryOp::EqMissing => Some(a.total_cmp(b).is_eq()),
            BinaryOp::NotEqMissing => Some(a.total_cmp(b).is_ne()),
            _ if a.is_null() || b.is_null() => None,
            _ => {
                let ord = a.total_cmp(b);
                Some(match op {
                    BinaryOp::Eq => ord.is_eq(),
                    BinaryOp::NotEq => ord.is_ne(),
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::LtEq => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                })
            }
        })
        .collect();
    Column::from_array(l.name(), Arc::new(out))
}

fn float_binary(
    l: &Column,
    r: &Column,
    dtype: &DataType,
    f: impl Fn(f64, f64) -> f64,
) -> QuiverResult<Column> {
    let (lv, rv) = (l.to_f64()?, r.to_f64()?);
    let out: Float64Array = lv
        .iter()
        .zip(&rv)
        .map(|(a, b)| Some(f((*a)?, (*b)?)))
        .collect();
    Column::from_array(l.name(), Arc::new(out))?.cast(dtype)
}

fn int_binary(
    l: &Column,
    r: &Column,
    dtype: &DataType,
    f: impl Fn(i128, i128) -> Option<i128>,
) -> QuiverResult<Column> {
    let (lv, rv) = (l.to_values()?, r.to_values()?);
    let values = lv
        .iter()
        .zip(&rv)
        .map(|(a, b)| match (int_of(a), int_of(b)) {
            (Some(x), Some(y)) => f(x, y).map_or(Ok(Value::Null), |v| int_in_range(v, dtype)),
            _ => Ok(Value::Null),
        })
        .collect::<QuiverResult<Vec<_>>>()?;
    Column::from_typed_values(l.name(), dtype.clone(), &values)
}

/// `v` as a value of integer `dtype`; `ComputeError` when it does not fit.
fn int_in_range(v: i128, dtype: &DataType) -> QuiverResult<Value> {
    value_from_i128(v)?
        .cast(dtype)
        .map_err(|_| QuiverError::compute(format!("integer result {v} overflows {dtype}")))
}

/// Integer division rounding toward negative infinity; `None` on division by zero.
fn floor_div(a: i128, b: i128) -> Option<i128> {
    if b == 0 {
        return None;
    }
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor; `None` on division by zero.
fn floor_mod(a: i128, b: i128) -> Option<i128> {
    if b == 0 {
        return None;
    }
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r + b
    } else {
        r
    }
}

pub(crate) fn int_of(value: &Value) -> Option<i128> {
    match value {
        Value::Int8(v) => Some(i128::from(*v)),
        Value::Int16(v) => Some(i128::from(*v)),
        Value::Int32(v) => Some(i128::from(*v)),
        Value::Int64(v) => Some(i128::from(*v)),
        Value::UInt8(v) => Some(i128::from(*v)),
        Value::UInt16(v) => Some(i128::from(*v)),
        Value::UInt32(v) => Some(i128::from(*v)),
        Value::UInt64(v) => Some(i128::from(*v)),
        Value::Boolean(v) => Some(i128::from(*v)),
        _ => None,
    }
}

pub(crate) fn value_from_i128(v: i128) -> QuiverResult<Value> {
    if let Ok(x) = i64::try_from(v) {
        Ok(Value::Int64(x))
    } else if let Ok(x) = u64::try_from(v) {
        Ok(Value::UInt64(x))
    } else {
        Err(QuiverError::compute(format!("integer result {v} overflows 64 bits")))
    }
}

// ============================================================================
// Temporal arithmetic
// ============================================================================

fn is_temporal_arithmetic(op: BinaryOp, left: &DataType, right: &DataType) -> bool {
    matches!(op, BinaryOp::Add | BinaryOp::Subtract)
        && (left.is_temporal() || right.is_temporal())
}

fn temporal_arithmetic(
    name: &str,
    left: &Column,
    op: BinaryOp,
    right: &Column,
    out: &DataType,
) -> QuiverResult<Column> {
    let unit = match out {
        DataType::Datetime(unit, _) | DataType::Duration(unit) => *unit,
        other => {
            return Err(QuiverError::internal(format!(
                "temporal arithmetic produced non-temporal dtype {other}"
            )))
        }
    };
    let (lv, rv) = (left.to_values()?, right.to_values()?);
    let values = lv
        .iter()
        .zip(&rv)
        .map(|(a, b)| {
            let (Some(x), Some(y)) = (ticks(a, unit)?, ticks(b, unit)?) else {
                return Ok(Value::Null);
            };
            let v = match op {
                BinaryOp::Subtract => x.checked_sub(y),
                _ => x.checked_add(y),
            }
            .ok_or_else(|| QuiverError::compute(format!("temporal overflow in '{op}'")))?;
            Ok(match out {
                DataType::Datetime(u, tz) => Value::Datetime(v, *u, tz.clone()),
                _ => Value::Duration(v, unit),
            })
        })
        .collect::<QuiverResult<Vec<_>>>()?;
    Column::from_typed_values(name, out.clone(), &values)
}

fn ticks(value: &Value, unit: TimeUnit) -> QuiverResult<Option<i64>> {
    match value {
        Value::Datetime(v, u, _) | Value::Duration(v, u) => u.convert(*v, unit).map(Some),
        Value::Null => Ok(None),
        other => Err(QuiverError::dtype_mismatch(format!(
            "expected a temporal value, got {}",
            other.dtype()
        ))),
    }
}

// ============================================================================
// Null-skipping combination
// ============================================================================

/// Combine `acc` and `next` with `op`, skipping nulls: where one side is null
/// the other side is kept, and the result is null only where both are.
pub(crate) fn combine_skip_nulls(acc: Column, op: BinaryOp, next: Column) -> QuiverResult<Column> {
    let name = acc.name().to_string();
    let (acc, next) = broadcast_pair(acc, next, "row-wise reduction")?;
    let combined = binary(acc.clone(), op, next.clone())?;
    let dtype = combined.dtype().clone();
    if dtype == DataType::Null {
        return Ok(combined);
    }
    let a = acc.cast(&dtype)?.as_array()?;
    let b = next.cast(&dtype)?.as_array()?;
    let c = combined.as_array()?;
    let a_missing = null_mask(&acc);
    let b_missing = null_mask(&next);
    let inner = zip(&b_missing, &a, &c).map_err(|e| QuiverError::from_kernel("zip", e))?;
    let out = zip(&a_missing, &b, &inner).map_err(|e| QuiverError::from_kernel("zip", e))?;
    Column::from_array(name, out)
}

fn null_mask(column: &Column) -> BooleanArray {
    BooleanArray::from(column.validity().iter().map(|v| !v).collect::<Vec<_>>())
}

// ============================================================================
// Unary operators
// ============================================================================

/// Evaluate a unary operator.
pub(crate) fn unary(op: UnaryOp, input: Column) -> QuiverResult<Column> {
    let name = input.name().to_string();
    let out_dtype = op.result_type(input.dtype()).ok_or_else(|| {
        QuiverError::dtype_mismatch(format!("'{op}' is not defined for {}", input.dtype()))
    })?;
    match op {
        UnaryOp::IsNull | UnaryOp::IsNotNull => {
            let want_valid = op == UnaryOp::IsNotNull;
            let out = BooleanArray::from(
                input
                    .validity()
                    .into_iter()
                    .map(|valid| valid == want_valid)
                    .collect::<Vec<_>>(),
            );
            Column::from_array(name, Arc::new(out))
        }
        _ if *input.dtype() == DataType::Null => {
            Ok(Column::full_null(name, out_dtype, input.len()))
        }
        UnaryOp::Not => {
            let out = boolean::not(&to_boolean(&input, "not")?)
                .map_err(|e| QuiverError::from_kernel("not", e))?;
            Column::from_array(name, Arc::new(out))
        }
        UnaryOp::Neg => {
            let out = numeric::neg(&input.as_array()?)
                .map_err(|e| QuiverError::from_kernel("neg", e))?;
            Column::from_array(name, out)
        }
        UnaryOp::Abs => {
            let values = input
                .to_values()?
                .iter()
                .map(abs_value)
                .collect::<QuiverResult<Vec<_>>>()?;
            Column::from_typed_values(name, out_dtype, &values)
        }
    }
}

fn abs_value(value: &Value) -> QuiverResult<Value> {
    let overflow = || QuiverError::compute(format!("abs overflows for {value}"));
    Ok(match value {
        Value::Int8(v) => Value::Int8(v.checked_abs().ok_or_else(overflow)?),
        Value::Int16(v) => Value::Int16(v.checked_abs().ok_or_else(overflow)?),
        Value::Int32(v) => Value::Int32(v.checked_abs().ok_or_else(overflow)?),
        Value::Int64(v) => Value::Int64(v.checked_abs().ok_or_else(overflow)?),
        Value::Float32(v) => Value::Float32(v.abs()),
        Value::Float64(v) => Value::Float64(v.abs()),
        Value::Duration(v, u) => Value::Duration(v.checked_abs().ok_or_else(overflow)?, *u),
        other => other.clone(),
    })
}

/// The column as a boolean array; a `Null` column reads as all-null booleans.
pub(crate) fn to_boolean(column: &Column, context: &str) -> QuiverResult<BooleanArray> {
    match column.dtype() {
        DataType::Boolean => {
            let array = column.as_array()?;
            array
                .as_boolean_opt()
                .cloned()
                .ok_or_else(|| QuiverError::internal("Boolean column without a boolean array"))
        }
        DataType::Null => Ok(BooleanArray::new_null(column.len())),
        other => Err(QuiverError::dtype_mismatch(format!(
            "'{context}' requires a Boolean input, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_col(name: &str, values: &[Option<i64>]) -> Column {
        Column::from_iter_values(name, values.iter().copied()).unwrap()
    }

    #[test]
    fn test_floor_division_and_modulo() {
        let a = int_col("a", &[Some(7), Some(-7), Some(7), Some(1)]);
        let b = int_col("b", &[Some(2), Some(2), Some(-2), Some(0)]);
        let q = binary(a.clone(), BinaryOp::Divide, b.clone()).unwrap();
        assert_eq!(
            q.to_values().unwrap(),
            vec![Value::Int64(3), Value::Int64(-4), Value::Int64(-4), Value::Null]
        );
        let m = binary(a, BinaryOp::Modulo, b).unwrap();
        assert_eq!(
            m.to_values().unwrap(),
            vec![Value::Int64(1), Value::Int64(1), Value::Int64(-1), Value::Null]
        );
    }

    #[test]
    fn test_floor_division_overflow() {
        let a = Column::from_iter_values("a", [Some(-128i8), Some(6)]).unwrap();
        let b = Column::from_iter_values("b", [Some(-1i8), Some(-1)]).unwrap();
        let err = binary(a, BinaryOp::Divide, b).unwrap_err();
        assert!(matches!(err, QuiverError::ComputeError(_)), "{err}");

        let a = int_col("a", &[Some(i64::MIN)]);
        let b = int_col("b", &[Some(-1)]);
        let err = binary(a, BinaryOp::Divide, b).unwrap_err();
        assert!(matches!(err, QuiverError::ComputeError(_)), "{err}");
    }

    #[test]
    fn test_pow_promotes_to_float() {
        let a = int_col("a", &[Some(1), None, Some(4)]);
        let b = int_col("b", &[Some(1), Some(2), Some(4)]);
        let out = binary(a, BinaryOp::Pow, b).unwrap();
        assert_eq!(*out.dtype(), DataType::Float64);
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::Float64(1.0), Value::Null, Value::Float64(256.0)]
        );
    }

    #[test]
    fn test_broadcast_and_length_mismatch() {
        let a = int_col("a", &[Some(1), Some(2), Some(3)]);
        let one = int_col("lit", &[Some(10)]);
        let out = binary(a.clone(), BinaryOp::Add, one).unwrap();
        assert_eq!(out.name(), "a");
        assert_eq!(out.len(), 3);

        let two = int_col("b", &[Some(1), Some(2)]);
        let err = binary(a, BinaryOp::Add, two).unwrap_err();
        assert!(err.is_length_mismatch());
    }

    #[test]
    fn test_kleene_logic() {
        let a = Column::from_iter_values("a", [Some(true), Some(false), None]).unwrap();
        let null = Column::full_null("n", DataType::Boolean, 3);
        let and = binary(a.clone(), BinaryOp::And, null.clone()).unwrap();
        assert_eq!(
            and.to_values().unwrap(),
            vec![Value::Null, Value::Boolean(false), Value::Null]
        );
        let or = binary(a, BinaryOp::Or, null).unwrap();
        assert_eq!(
            or.to_values().unwrap(),
            vec![Value::Boolean(true), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_null_safe_equality() {
        let a = int_col("a", &[Some(1), None, None]);
        let b = int_col("b", &[Some(1), None, Some(2)]);
        let eq = binary(a.clone(), BinaryOp::Eq, b.clone()).unwrap();
        assert_eq!(
            eq.to_values().unwrap(),
            vec![Value::Boolean(true), Value::Null, Value::Null]
        );
        let eq_missing = binary(a, BinaryOp::EqMissing, b).unwrap();
        assert_eq!(
            eq_missing.to_values().unwrap(),
            vec![Value::Boolean(true), Value::Boolean(true), Value::Boolean(false)]
        );
    }

    #[test]
    fn test_datetime_minus_datetime() {
        let t = DataType::Datetime(TimeUnit::Milliseconds, None);
        let a = Column::from_typed_values(
            "a",
            t.clone(),
            &[Value::Datetime(5_000, TimeUnit::Milliseconds, None)],
        )
        .unwrap();
        let b = Column::from_typed_values(
            "b",
            DataType::Datetime(TimeUnit::Microseconds, None),
            &[Value::Datetime(1_000_000, TimeUnit::Microseconds, None)],
        )
        .unwrap();
        let out = binary(a, BinaryOp::Subtract, b).unwrap();
        assert_eq!(*out.dtype(), DataType::Duration(TimeUnit::Microseconds));
        assert_eq!(
            out.get(0).unwrap(),
            Value::Duration(4_000_000, TimeUnit::Microseconds)
        );
    }

    #[test]
    fn test_combine_skip_nulls() {
        let a = int_col("a", &[None, Some(2), None]);
        let b = int_col("b", &[Some(4), None, None]);
        let out = combine_skip_nulls(a, BinaryOp::Add, b).unwrap();
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::Int64(4), Value::Int64(2), Value::Null]
        );
    }

    #[test]
    fn test_abs_and_is_null() {
        let a = int_col("x", &[Some(-1), Some(0), None]);
        let abs = unary(UnaryOp::Abs, a.clone()).unwrap();
        assert_eq!(
            abs.to_values().unwrap(),
            vec![Value::Int64(1), Value::Int64(0), Value::Null]
        );
        let nulls = unary(UnaryOp::IsNull, a).unwrap();
        assert_eq!(
            nulls.to_values().unwrap(),
            vec![Value::Boolean(false), Value::Boolean(false), Value::Boolean(true)]
        );
    }

    #[test]
    fn test_logical_on_integers_rejected() {
        let a = int_col("a", &[Some(1)]);
        let err = binary(a.clone(), BinaryOp::And, a).unwrap_err();
        assert!(err.is_dtype_mismatch());
    }
}
