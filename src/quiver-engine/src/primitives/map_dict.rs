//! Dictionary remapping.

use std::collections::HashMap;

use common_error::{QuiverError, QuiverResult};
use quiver_core::{infer_dtype, Column, DataType, RowKey, Value};

/// Remap every row of `input` through `mapping`.
///
/// Later entries override earlier ones with the same key; a `Null` key maps
/// source nulls. Struct rows are looked up by their first field. Rows without
/// an entry take the matching row of `default`, which is only evaluated when
/// at least one row misses, or null when there is no default.
pub(crate) fn map_dict<F>(
    input: &Column,
    mapping: &[(Value, Value)],
    default: Option<F>,
) -> QuiverResult<Column>
where
    F: FnOnce() -> QuiverResult<Column>,
{
    let lookup: HashMap<RowKey, usize> = mapping
        .iter()
        .enumerate()
        .map(|(i, (from, _))| (RowKey::single(from.clone()), i))
        .collect();
    let hits: Vec<Option<usize>> = input
        .to_values()?
        .into_iter()
        .map(|v| lookup.get(&RowKey::single(lookup_key(v))).copied())
        .collect();

    let targets: Vec<Value> = mapping.iter().map(|(_, to)| to.clone()).collect();
    let mut dtype = infer_dtype(&targets)?;
    let fallback = match default {
        Some(eval) if hits.iter().any(Option::is_none) => {
            let column = eval()?.broadcast(input.len())?;
            dtype = dtype.supertype(column.dtype()).ok_or_else(|| {
                QuiverError::dtype_mismatch(format!(
                    "map_dict default of dtype {} does not combine with mapped dtype {dtype}",
                    column.dtype()
                ))
            })?;
            Some(column.to_values()?)
        }
        _ => None,
    };

    let values: Vec<Value> = hits
        .iter()
        .enumerate()
        .map(|(row, hit)| match (hit, &fallback) {
            (Some(i), _) => targets[*i].clone(),
            (None, Some(fallback)) => fallback[row].clone(),
            (None, None) => Value::Null,
        })
        .collect();
    if dtype == DataType::Null {
        return Ok(Column::full_null(input.name(), dtype, values.len()));
    }
    Column::from_typed_values(input.name(), dtype, &values)
}

fn lookup_key(value: Value) -> Value {
    match value {
        Value::Struct { values, .. } => values.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}
