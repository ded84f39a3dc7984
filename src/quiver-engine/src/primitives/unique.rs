//! Distinct values and their counts.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::UInt32Array;
use common_error::{QuiverError, QuiverResult};
use quiver_core::{Column, RowKey, Value};

/// First-occurrence row of every distinct value, with its occurrence count.
fn distinct_rows(values: &[Value]) -> QuiverResult<(Vec<u32>, Vec<u32>)> {
    let mut seen: HashMap<RowKey, usize> = HashMap::new();
    let mut firsts = Vec::new();
    let mut counts: Vec<u32> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        match seen.get(&RowKey::single(value.clone())) {
            Some(&slot) => counts[slot] += 1,
            None => {
                seen.insert(RowKey::single(value.clone()), firsts.len());
                firsts.push(
                    u32::try_from(row)
                        .map_err(|_| QuiverError::compute("row index exceeds UInt32 range"))?,
                );
                counts.push(1);
            }
        }
    }
    Ok((firsts, counts))
}

/// Distinct values. `stable` keeps first-occurrence order; otherwise the
/// result is sorted with nulls first.
pub(crate) fn unique(input: &Column, stable: bool) -> QuiverResult<Column> {
    let values = input.to_values()?;
    let (mut rows, _) = distinct_rows(&values)?;
    if !stable {
        rows.sort_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]));
    }
    input.take(&rows)
}

/// Occurrence count of every distinct value, in first-occurrence order.
pub(crate) fn unique_counts(input: &Column) -> QuiverResult<Column> {
    let (_, counts) = distinct_rows(&input.to_values()?)?;
    Column::from_array(input.name(), Arc::new(UInt32Array::from(counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::DataType;

    #[test]
    fn test_unique_stable_and_sorted() {
        let col =
            Column::from_iter_values("a", [Some(2i64), Some(1), None, Some(2), Some(1)]).unwrap();
        let stable = unique(&col, true).unwrap();
        assert_eq!(
            stable.to_values().unwrap(),
            vec![Value::Int64(2), Value::Int64(1), Value::Null]
        );
        let sorted = unique(&col, false).unwrap();
        assert_eq!(
            sorted.to_values().unwrap(),
            vec![Value::Null, Value::Int64(1), Value::Int64(2)]
        );
    }

    #[test]
    fn test_unique_empty_keeps_dtype() {
        let col = Column::empty("a", DataType::Utf8);
        let out = unique(&col, false).unwrap();
        assert!(out.is_empty());
        assert_eq!(*out.dtype(), DataType::Utf8);
    }

    #[test]
    fn test_unique_counts() {
        let col = Column::from_iter_values("id", ["a", "b", "b", "c", "c", "c"]).unwrap();
        let out = unique_counts(&col).unwrap();
        assert_eq!(out.name(), "id");
        assert_eq!(*out.dtype(), DataType::UInt32);
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::UInt32(1), Value::UInt32(2), Value::UInt32(3)]
        );
    }
}
