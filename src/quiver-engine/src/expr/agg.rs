//! Aggregate evaluation.
//!
//! Every aggregate reduces a column to a single row that keeps the input's name.

use std::collections::{HashMap, HashSet};

use common_error::{QuiverError, QuiverResult};
use quiver_core::{Column, DataType, RowKey, Value};
use quiver_logical::expr::AggFunc;

use super::kernels::{int_of, value_from_i128};

/// Reduce `input` with `func`.
pub(crate) fn aggregate(func: AggFunc, input: &Column) -> QuiverResult<Column> {
    let out_dtype = func.result_type(input.dtype()).ok_or_else(|| {
        QuiverError::dtype_mismatch(format!("'{func}' is not defined for {}", input.dtype()))
    })?;
    let value = match func {
        AggFunc::Count => count_value(input.len() - input.null_count())?,
        AggFunc::NullCount => count_value(input.null_count())?,
        AggFunc::NUnique => {
            let distinct: HashSet<RowKey> = input
                .to_values()?
                .into_iter()
                .map(RowKey::single)
                .collect();
            count_value(distinct.len())?
        }
        AggFunc::First if input.is_empty() => Value::Null,
        AggFunc::First => input.get(0)?,
        AggFunc::Last if input.is_empty() => Value::Null,
        AggFunc::Last => input.get(input.len() - 1)?,
        AggFunc::Implode => Value::list(input.dtype().clone(), input.to_values()?),
        AggFunc::Min => extreme(input, |ord| ord.is_lt())?,
        AggFunc::Max => extreme(input, |ord| ord.is_gt())?,
        AggFunc::Sum => sum(input, &out_dtype)?,
        AggFunc::Mean => mean(input, &out_dtype)?,
        AggFunc::Entropy { base, normalize } => entropy(input, base, normalize)?,
    };
    Column::from_typed_values(input.name(), out_dtype, &[value])
}

fn count_value(n: usize) -> QuiverResult<Value> {
    u32::try_from(n)
        .map(Value::UInt32)
        .map_err(|_| QuiverError::compute(format!("count {n} does not fit in UInt32")))
}

fn extreme(input: &Column, better: impl Fn(std::cmp::Ordering) -> bool) -> QuiverResult<Value> {
    let mut best: Option<Value> = None;
    for v in input.to_values()?.into_iter().filter(|v| !v.is_null()) {
        best = match best {
            Some(b) if !better(v.total_cmp(&b)) => Some(b),
            _ => Some(v),
        };
    }
    Ok(best.unwrap_or(Value::Null))
}

#[allow(clippy::cast_possible_truncation)]
fn sum(input: &Column, out_dtype: &DataType) -> QuiverResult<Value> {
    match out_dtype {
        DataType::Float32 => {
            let total: f64 = input.to_f64()?.into_iter().flatten().sum();
            Ok(Value::Float32(total as f32))
        }
        DataType::Float64 => Ok(Value::Float64(input.to_f64()?.into_iter().flatten().sum())),
        DataType::Duration(unit) => {
            let mut total = 0i64;
            for v in input.to_values()? {
                if let Value::Duration(ticks, _) = v {
                    total = total
                        .checked_add(ticks)
                        .ok_or_else(|| QuiverError::compute("duration sum overflows"))?;
                }
            }
            Ok(Value::Duration(total, *unit))
        }
        _ => {
            let mut total = 0i128;
            for v in input.to_values()? {
                if let Some(x) = int_of(&v) {
                    total = total
                        .checked_add(x)
                        .ok_or_else(|| QuiverError::compute("integer sum overflows"))?;
                }
            }
            value_from_i128(total)
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn mean(input: &Column, out_dtype: &DataType) -> QuiverResult<Value> {
    let present: Vec<f64> = input.to_f64()?.into_iter().flatten().collect();
    if present.is_empty() {
        return Ok(Value::Null);
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    Ok(match out_dtype {
        DataType::Float32 => Value::Float32(mean as f32),
        _ => Value::Float64(mean),
    })
}

/// Shannon entropy of the empirical distribution of the non-null values.
#[allow(clippy::cast_precision_loss)]
fn entropy(input: &Column, base: Option<f64>, normalize: bool) -> QuiverResult<Value> {
    let mut counts: HashMap<RowKey, usize> = HashMap::new();
    let mut total = 0usize;
    for v in input.to_values()?.into_iter().filter(|v| !v.is_null()) {
        *counts.entry(RowKey::single(v)).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return Ok(Value::Null);
    }
    let n = total as f64;
    let h: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum();
    let levels = counts.len();
    let out = if normalize {
        if levels < 2 {
            0.0
        } else {
            h / (levels as f64).ln()
        }
    } else {
        match base {
            Some(b) => h / b.ln(),
            None => h,
        }
    };
    Ok(Value::Float64(out))
}
