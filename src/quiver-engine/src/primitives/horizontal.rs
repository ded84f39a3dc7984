//! Row-wise reductions over several inputs.

use common_error::{QuiverError, QuiverResult};
use quiver_core::{Column, DataType, Value};
use quiver_logical::expr::{BinaryOp, HorizontalOp};

use crate::expr::kernels::{broadcast_all, combine_skip_nulls};

/// Reduce `inputs` row by row. Nulls are skipped; a row is null only when every
/// input is null there. The result takes the first input's name.
pub(crate) fn horizontal(op: HorizontalOp, inputs: Vec<Column>) -> QuiverResult<Column> {
    if inputs.is_empty() {
        return Err(QuiverError::invalid_parameter(format!(
            "{} needs at least one input",
            op.name()
        )));
    }
    match op {
        HorizontalOp::Min => extreme(inputs, |ord| ord.is_lt()),
        HorizontalOp::Max => extreme(inputs, |ord| ord.is_gt()),
        HorizontalOp::Sum => fold_skip_nulls(None, BinaryOp::Add, inputs),
        HorizontalOp::Any => fold_skip_nulls(None, BinaryOp::Or, inputs),
        HorizontalOp::All => fold_skip_nulls(None, BinaryOp::And, inputs),
    }
}

/// Left fold of `inputs` into `acc` with `op`, skipping nulls per row.
pub(crate) fn fold_skip_nulls(
    acc: Option<Column>,
    op: BinaryOp,
    inputs: Vec<Column>,
) -> QuiverResult<Column> {
    let mut iter = inputs.into_iter();
    let mut acc = match acc {
        Some(acc) => acc,
        None => iter
            .next()
            .ok_or_else(|| QuiverError::invalid_parameter("fold needs at least one input"))?,
    };
    for next in iter {
        acc = combine_skip_nulls(acc, op, next)?;
    }
    Ok(acc)
}

fn extreme(
    inputs: Vec<Column>,
    better: impl Fn(std::cmp::Ordering) -> bool,
) -> QuiverResult<Column> {
    let columns = broadcast_all(inputs, "horizontal reduction")?;
    let name = columns[0].name().to_string();
    let height = columns[0].len();
    let values = columns
        .iter()
        .map(Column::to_values)
        .collect::<QuiverResult<Vec<_>>>()?;
    let mut dtype = DataType::Null;
    for column in &columns {
        dtype = dtype.supertype(column.dtype()).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!(
                "cannot compare {dtype} with {} row-wise",
                column.dtype()
            ))
        })?;
    }

    let out: Vec<Value> = (0..height)
        .map(|row| {
            values
                .iter()
                .map(|col| &col[row])
                .filter(|v| !v.is_null())
                .fold(None::<&Value>, |best, v| match best {
                    Some(b) if !better(v.total_cmp(b)) => Some(b),
                    _ => Some(v),
                })
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();
    if dtype == DataType::Null {
        return Ok(Column::full_null(name, dtype, height));
    }
    Column::from_typed_values(name, dtype, &out)
}
