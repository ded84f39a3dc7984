//! Conversion between scalar values and Arrow chunks.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, DurationMicrosecondArray, DurationMillisecondArray,
    DurationNanosecondArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, ListArray, NullArray, StringArray, StructArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{
    DataType as ArrowDataType, DurationMicrosecondType, DurationMillisecondType,
    DurationNanosecondType, Field as ArrowField, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimeUnit as ArrowTimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use common_error::{QuiverError, QuiverResult};

use crate::types::{DataType, Field, TimeUnit, Value};

/// Collect the non-null payloads of `values` for a primitive dtype, casting
/// values whose dtype differs.
macro_rules! collect_native {
    ($values:expr, $dtype:expr, $variant:ident) => {{
        let mut out = Vec::with_capacity($values.len());
        for v in $values {
            out.push(match v {
                Value::Null => None,
                Value::$variant(x) => Some(x.clone()),
                other => match other.cast($dtype)? {
                    Value::$variant(x) => Some(x),
                    cast => {
                        return Err(QuiverError::internal(format!(
                            "cast to {} produced {cast:?}",
                            $dtype
                        )))
                    }
                },
            });
        }
        out
    }};
}

/// Collect temporal ticks, converting units and zones through `Value::cast`.
fn collect_ticks(values: &[Value], dtype: &DataType) -> QuiverResult<Vec<Option<i64>>> {
    values
        .iter()
        .map(|v| match v {
            Value::Null => Ok(None),
            other => match other.cast(dtype)? {
                Value::Datetime(t, ..) | Value::Duration(t, _) => Ok(Some(t)),
                cast => Err(QuiverError::internal(format!(
                    "cast to {dtype} produced {cast:?}"
                ))),
            },
        })
        .collect()
}

/// Build one Arrow chunk of `dtype` holding `values`.
pub(crate) fn values_to_array(values: &[Value], dtype: &DataType) -> QuiverResult<ArrayRef> {
    let array: ArrayRef = match dtype {
        DataType::Null => {
            if let Some(v) = values.iter().find(|v| !v.is_null()) {
                return Err(QuiverError::dtype_mismatch(format!(
                    "value {v} in a column of dtype Null"
                )));
            }
            Arc::new(NullArray::new(values.len()))
        }
        DataType::Boolean => Arc::new(BooleanArray::from(collect_native!(values, dtype, Boolean))),
        DataType::Int8 => Arc::new(Int8Array::from(collect_native!(values, dtype, Int8))),
        DataType::Int16 => Arc::new(Int16Array::from(collect_native!(values, dtype, Int16))),
        DataType::Int32 => Arc::new(Int32Array::from(collect_native!(values, dtype, Int32))),
        DataType::Int64 => Arc::new(Int64Array::from(collect_native!(values, dtype, Int64))),
        DataType::UInt8 => Arc::new(UInt8Array::from(collect_native!(values, dtype, UInt8))),
        DataType::UInt16 => Arc::new(UInt16Array::from(collect_native!(values, dtype, UInt16))),
        DataType::UInt32 => Arc::new(UInt32Array::from(collect_native!(values, dtype, UInt32))),
        DataType::UInt64 => Arc::new(UInt64Array::from(collect_native!(values, dtype, UInt64))),
        DataType::Float32 => Arc::new(Float32Array::from(collect_native!(values, dtype, Float32))),
        DataType::Float64 => Arc::new(Float64Array::from(collect_native!(values, dtype, Float64))),
        DataType::Utf8 => Arc::new(StringArray::from(collect_native!(values, dtype, Utf8))),
        DataType::Datetime(unit, tz) => {
            let ticks = collect_ticks(values, dtype)?;
            match unit {
                TimeUnit::Milliseconds => Arc::new(
                    TimestampMillisecondArray::from(ticks).with_timezone_opt(tz.clone()),
                ),
                TimeUnit::Microseconds => Arc::new(
                    TimestampMicrosecondArray::from(ticks).with_timezone_opt(tz.clone()),
                ),
                TimeUnit::Nanoseconds => Arc::new(
                    TimestampNanosecondArray::from(ticks).with_timezone_opt(tz.clone()),
                ),
            }
        }
        DataType::Duration(unit) => {
            let ticks = collect_ticks(values, dtype)?;
            match unit {
                TimeUnit::Milliseconds => Arc::new(DurationMillisecondArray::from(ticks)),
                TimeUnit::Microseconds => Arc::new(DurationMicrosecondArray::from(ticks)),
                TimeUnit::Nanoseconds => Arc::new(DurationNanosecondArray::from(ticks)),
            }
        }
        DataType::List(inner) => list_to_array(values, dtype, inner)?,
        DataType::Struct(fields) => struct_to_array(values, dtype, fields)?,
    };
    Ok(array)
}

fn list_to_array(values: &[Value], dtype: &DataType, inner: &DataType) -> QuiverResult<ArrayRef> {
    let mut flat = Vec::new();
    let mut lengths = Vec::with_capacity(values.len());
    let mut validity = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Null => {
                lengths.push(0);
                validity.push(false);
            }
            Value::List { values: items, .. } => {
                lengths.push(items.len());
                validity.push(true);
                flat.extend(items.iter().cloned());
            }
            other => {
                return Err(QuiverError::dtype_mismatch(format!(
                    "value {other} in a column of dtype {dtype}"
                )))
            }
        }
    }
    let child = values_to_array(&flat, inner)?;
    let nulls = validity.iter().any(|v| !v).then(|| NullBuffer::from(validity));
    let field = Arc::new(ArrowField::new("item", inner.to_arrow(), true));
    let list = ListArray::try_new(field, OffsetBuffer::from_lengths(lengths), child, nulls)?;
    Ok(Arc::new(list))
}

fn struct_to_array(values: &[Value], dtype: &DataType, fields: &[Field]) -> QuiverResult<ArrayRef> {
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(values.len()); fields.len()];
    let mut validity = Vec::with_capacity(values.len());
    for v in values {
        match v.cast(dtype)? {
            Value::Null => {
                validity.push(false);
                for column in &mut columns {
                    column.push(Value::Null);
                }
            }
            Value::Struct { values: row, .. } => {
                validity.push(true);
                for (column, item) in columns.iter_mut().zip(row) {
                    column.push(item);
                }
            }
            other => {
                return Err(QuiverError::dtype_mismatch(format!(
                    "value {other} in a column of dtype {dtype}"
                )))
            }
        }
    }
    let arrays = fields
        .iter()
        .zip(&columns)
        .map(|(f, column)| values_to_array(column, &f.dtype))
        .collect::<QuiverResult<Vec<_>>>()?;
    let ArrowDataType::Struct(arrow_fields) = dtype.to_arrow() else {
        return Err(QuiverError::internal("struct dtype did not map to an arrow struct"));
    };
    let nulls = validity.iter().any(|v| !v).then(|| NullBuffer::from(validity));
    Ok(Arc::new(StructArray::try_new(arrow_fields, arrays, nulls)?))
}

fn downcast_error(array: &dyn Array) -> QuiverError {
    QuiverError::internal(format!("unexpected arrow array of type {}", array.data_type()))
}

macro_rules! primitive_at {
    ($array:expr, $i:expr, $arrow_ty:ty, $variant:ident) => {
        Value::$variant(
            $array
                .as_primitive_opt::<$arrow_ty>()
                .ok_or_else(|| downcast_error($array))?
                .value($i),
        )
    };
}

/// Read position `i` of an Arrow chunk as a scalar.
pub(crate) fn value_at(array: &dyn Array, i: usize) -> QuiverResult<Value> {
    if matches!(array.data_type(), ArrowDataType::Null) || array.is_null(i) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        ArrowDataType::Boolean => Value::Boolean(
            array
                .as_boolean_opt()
                .ok_or_else(|| downcast_error(array))?
                .value(i),
        ),
        ArrowDataType::Int8 => primitive_at!(array, i, Int8Type, Int8),
        ArrowDataType::Int16 => primitive_at!(array, i, Int16Type, Int16),
        ArrowDataType::Int32 => primitive_at!(array, i, Int32Type, Int32),
        ArrowDataType::Int64 => primitive_at!(array, i, Int64Type, Int64),
        ArrowDataType::UInt8 => primitive_at!(array, i, UInt8Type, UInt8),
        ArrowDataType::UInt16 => primitive_at!(array, i, UInt16Type, UInt16),
        ArrowDataType::UInt32 => primitive_at!(array, i, UInt32Type, UInt32),
        ArrowDataType::UInt64 => primitive_at!(array, i, UInt64Type, UInt64),
        ArrowDataType::Float32 => primitive_at!(array, i, Float32Type, Float32),
        ArrowDataType::Float64 => primitive_at!(array, i, Float64Type, Float64),
        ArrowDataType::Utf8 => Value::Utf8(
            array
                .as_string_opt::<i32>()
                .ok_or_else(|| downcast_error(array))?
                .value(i)
                .to_string(),
        ),
        ArrowDataType::Timestamp(unit, tz) => {
            let tz = tz.as_ref().map(|t| t.to_string());
            let (ticks, unit) = match unit {
                ArrowTimeUnit::Millisecond => (
                    primitive_ticks::<TimestampMillisecondType>(array, i)?,
                    TimeUnit::Milliseconds,
                ),
                ArrowTimeUnit::Microsecond => (
                    primitive_ticks::<TimestampMicrosecondType>(array, i)?,
                    TimeUnit::Microseconds,
                ),
                ArrowTimeUnit::Nanosecond => (
                    primitive_ticks::<TimestampNanosecondType>(array, i)?,
                    TimeUnit::Nanoseconds,
                ),
                ArrowTimeUnit::Second => return Err(downcast_error(array)),
            };
            Value::Datetime(ticks, unit, tz)
        }
        ArrowDataType::Duration(unit) => match unit {
            ArrowTimeUnit::Millisecond => Value::Duration(
                primitive_ticks::<DurationMillisecondType>(array, i)?,
                TimeUnit::Milliseconds,
            ),
            ArrowTimeUnit::Microsecond => Value::Duration(
                primitive_ticks::<DurationMicrosecondType>(array, i)?,
                TimeUnit::Microseconds,
            ),
            ArrowTimeUnit::Nanosecond => Value::Duration(
                primitive_ticks::<DurationNanosecondType>(array, i)?,
                TimeUnit::Nanoseconds,
            ),
            ArrowTimeUnit::Second => return Err(downcast_error(array)),
        },
        ArrowDataType::List(field) => {
            let list = array.as_list_opt::<i32>().ok_or_else(|| downcast_error(array))?;
            let inner = DataType::try_from_arrow(field.data_type())?;
            Value::List {
                inner,
                values: array_to_values(list.value(i).as_ref())?,
            }
        }
        ArrowDataType::Struct(_) => {
            let DataType::Struct(fields) = DataType::try_from_arrow(array.data_type())? else {
                return Err(downcast_error(array));
            };
            let st = array.as_struct_opt().ok_or_else(|| downcast_error(array))?;
            let values = st
                .columns()
                .iter()
                .map(|c| value_at(c.as_ref(), i))
                .collect::<QuiverResult<Vec<_>>>()?;
            Value::Struct { fields, values }
        }
        _ => return Err(downcast_error(array)),
    };
    Ok(value)
}

fn primitive_ticks<T>(array: &dyn Array, i: usize) -> QuiverResult<i64>
where
    T: arrow::datatypes::ArrowPrimitiveType<Native = i64>,
{
    Ok(array
        .as_primitive_opt::<T>()
        .ok_or_else(|| downcast_error(array))?
        .value(i))
}

/// Read a whole Arrow chunk as scalars.
pub(crate) fn array_to_values(array: &dyn Array) -> QuiverResult<Vec<Value>> {
    (0..array.len()).map(|i| value_at(array, i)).collect()
}

/// Read a numeric chunk as nullable f64.
pub(crate) fn array_to_f64(array: &dyn Array) -> QuiverResult<Vec<Option<f64>>> {
    if matches!(array.data_type(), ArrowDataType::Null) {
        return Ok(vec![None; array.len()]);
    }
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let floats = cast_with_options(array, &ArrowDataType::Float64, &options)
        .map_err(|e| QuiverError::dtype_mismatch(format!("cannot read as Float64: {e}")))?;
    let floats = floats
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| downcast_error(floats.as_ref()))?;
    Ok(floats.iter().collect())
}
