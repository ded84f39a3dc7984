//! List-cell primitives.

use std::sync::Arc;

use arrow::array::{BooleanArray, StringArray};
use common_error::{QuiverError, QuiverResult};
use common_runtime::{install, map_ordered};
use log::debug;
use quiver_core::{Batch, Column, DataType, Value};
use quiver_logical::Expr;

use crate::executor::{EvalContext, RandomSource, ELEMENT_COLUMN};
use crate::expr::ExprEvaluator;
use crate::expr::kernels::broadcast_all;

fn list_inner<'a>(input: &'a Column, op: &str) -> QuiverResult<&'a DataType> {
    input.dtype().list_inner().ok_or_else(|| {
        QuiverError::dtype_mismatch(format!("'{op}' requires a List input, got {}", input.dtype()))
    })
}

/// Cells of a list column; `None` for null cells.
fn cells(input: &Column) -> QuiverResult<Vec<Option<Vec<Value>>>> {
    Ok(input
        .to_values()?
        .into_iter()
        .map(|v| match v {
            Value::List { values, .. } => Some(values),
            _ => None,
        })
        .collect())
}

/// Evaluate `expr` once per list cell with the cell bound to `element()`.
///
/// Cells are independent; with `parallel` they run on worker threads and the
/// results are gathered in row order. Null cells stay null.
pub(crate) fn list_eval(
    input: &Column,
    expr: &Expr,
    parallel: bool,
    ctx: &EvalContext<'_>,
) -> QuiverResult<Column> {
    let inner = list_inner(input, "list_eval")?.clone();
    let cells = cells(input)?;
    debug!(
        "list_eval over {} cells of '{}' (parallel={parallel})",
        cells.len(),
        input.name()
    );

    let base_seed = if expr.draws_random() {
        Some(ctx.random().seed_for(None)?)
    } else {
        None
    };
    let eval_cell = |index: usize, values: &[Value]| -> QuiverResult<Column> {
        let column = Column::from_typed_values(ELEMENT_COLUMN, inner.clone(), values)?;
        let batch = Batch::new(vec![column])?;
        let random = base_seed.map(|base| RandomSource::derived(base, index));
        let cell_ctx = match &random {
            Some(random) => ctx.for_list_cell(&batch).with_random(random),
            None => ctx.for_list_cell(&batch),
        };
        ExprEvaluator::new().evaluate(expr, &cell_ctx)
    };
    let indexed: Vec<(usize, &Option<Vec<Value>>)> = cells.iter().enumerate().collect();
    let results: Vec<Option<Column>> = install(ctx.pool(), || {
        map_ordered(&indexed, parallel, |&(i, cell)| {
            cell.as_deref().map(|values| eval_cell(i, values)).transpose()
        })
    })?;

    let mut dtype = DataType::Null;
    for column in results.iter().flatten() {
        dtype = dtype.supertype(column.dtype()).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!(
                "list_eval produced incompatible dtypes {dtype} and {}",
                column.dtype()
            ))
        })?;
    }
    if results.iter().all(Option::is_none) {
        dtype = eval_cell(0, &[])?.dtype().clone();
    }

    let values = results
        .into_iter()
        .map(|r| match r {
            Some(column) => Ok(Value::list(dtype.clone(), column.cast(&dtype)?.to_values()?)),
            None => Ok(Value::Null),
        })
        .collect::<QuiverResult<Vec<_>>>()?;
    Column::from_typed_values(input.name(), DataType::List(Box::new(dtype)), &values)
}

/// Join the strings of every list cell with `separator`, skipping null items.
pub(crate) fn list_join(input: &Column, separator: &str) -> QuiverResult<Column> {
    let inner = list_inner(input, "list_join")?;
    if !matches!(inner, DataType::Utf8 | DataType::Null) {
        return Err(QuiverError::dtype_mismatch(format!(
            "'list_join' requires List(Utf8), got {}",
            input.dtype()
        )));
    }
    let out: StringArray = cells(input)?
        .into_iter()
        .map(|cell| {
            cell.map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(separator)
            })
        })
        .collect();
    Column::from_array(input.name(), Arc::new(out))
}

/// Whether every list cell contains the matching row of `item`.
pub(crate) fn list_contains(input: &Column, item: Column) -> QuiverResult<Column> {
    list_inner(input, "list_contains")?;
    let item = item.broadcast(input.len())?.to_values()?;
    let out: BooleanArray = cells(input)?
        .into_iter()
        .zip(&item)
        .map(|(cell, needle)| {
            cell.map(|items| items.iter().any(|v| v.total_cmp(needle).is_eq()))
        })
        .collect();
    Column::from_array(input.name(), Arc::new(out))
}

/// Row-wise concatenation into one list per row. List inputs contribute their
/// items; other inputs contribute their value. A null list cell contributes nothing.
pub(crate) fn concat_list(inputs: Vec<Column>) -> QuiverResult<Column> {
    let columns = broadcast_all(inputs, "concat_list")?;
    let first = columns
        .first()
        .ok_or_else(|| QuiverError::invalid_parameter("concat_list needs at least one input"))?;
    let name = first.name().to_string();
    let height = first.len();

    let mut inner = DataType::Null;
    for column in &columns {
        let item_dtype = column.dtype().list_inner().unwrap_or(column.dtype());
        inner = inner.supertype(item_dtype).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!(
                "concat_list cannot combine {inner} and {item_dtype}"
            ))
        })?;
    }

    let values = columns
        .iter()
        .map(Column::to_values)
        .collect::<QuiverResult<Vec<_>>>()?;
    let rows: Vec<Value> = (0..height)
        .map(|row| {
            let mut items = Vec::new();
            for (column, col_values) in columns.iter().zip(&values) {
                match (&col_values[row], column.dtype()) {
                    (Value::List { values, .. }, _) => items.extend(values.iter().cloned()),
                    (Value::Null, DataType::List(_)) => {}
                    (v, _) => items.push(v.clone()),
                }
            }
            Value::list(inner.clone(), items)
        })
        .collect();
    Column::from_typed_values(name, DataType::List(Box::new(inner)), &rows)
}
