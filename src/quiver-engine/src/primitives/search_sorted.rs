//! Binary search of query values in a sorted reference column.

use std::sync::Arc;

use arrow::array::UInt32Array;
use common_error::{QuiverError, QuiverResult};
use quiver_core::types::check_orderable;
use quiver_core::{Column, Value};
use quiver_logical::expr::SearchSortedSide;

/// Insertion index of every query value in `reference`, which must be sorted
/// ascending. Leading and trailing nulls in the reference are allowed.
///
/// A null query sorts after every non-null reference value: `Left` returns the
/// first slot after them, `Right` returns the reference length.
pub(crate) fn search_sorted(
    reference: &Column,
    queries: &Column,
    side: SearchSortedSide,
) -> QuiverResult<Column> {
    check_orderable(reference.dtype(), "search_sorted")?;
    let dtype = reference.dtype().supertype(queries.dtype()).ok_or_else(|| {
        QuiverError::dtype_mismatch(format!(
            "search_sorted cannot compare {} values against a {} reference",
            queries.dtype(),
            reference.dtype()
        ))
    })?;
    let values = reference.cast(&dtype)?.to_values()?;
    let leading = values.iter().take_while(|v| v.is_null()).count();
    let body: Vec<&Value> = values[leading..]
        .iter()
        .take_while(|v| !v.is_null())
        .collect();

    let indices = queries
        .cast(&dtype)?
        .to_values()?
        .iter()
        .map(|q| {
            let idx = if q.is_null() {
                match side {
                    SearchSortedSide::Left => leading + body.len(),
                    SearchSortedSide::Right => values.len(),
                }
            } else {
                let pos = match side {
                    SearchSortedSide::Left => body.partition_point(|v| v.total_cmp(q).is_lt()),
                    SearchSortedSide::Right => body.partition_point(|v| v.total_cmp(q).is_le()),
                };
                leading + pos
            };
            u32::try_from(idx)
                .map_err(|_| QuiverError::compute("insertion index exceeds UInt32 range"))
        })
        .collect::<QuiverResult<Vec<u32>>>()?;
    Column::from_array(reference.name(), Arc::new(UInt32Array::from(indices)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(reference: Column, queries: Column, side: SearchSortedSide) -> Vec<Value> {
        search_sorted(&reference, &queries, side)
            .unwrap()
            .to_values()
            .unwrap()
    }

    fn u32s(values: &[u32]) -> Vec<Value> {
        values.iter().copied().map(Value::UInt32).collect()
    }

    #[test]
    fn test_left_and_right_on_ties() {
        let a = Column::from_iter_values("a", [1i64, 1, 4, 4]).unwrap();
        let b = Column::from_iter_values("b", [0i64, 1, 2, 4, 5]).unwrap();
        assert_eq!(search(a.clone(), b.clone(), SearchSortedSide::Left), u32s(&[0, 0, 2, 2, 4]));
        assert_eq!(search(a, b, SearchSortedSide::Right), u32s(&[0, 2, 2, 4, 4]));
    }

    #[test]
    fn test_strings() {
        let a = Column::from_iter_values("a", ["b", "b", "d", "d"]).unwrap();
        let b = Column::from_iter_values("b", ["a", "b", "c", "d", "e"]).unwrap();
        assert_eq!(search(a.clone(), b.clone(), SearchSortedSide::Left), u32s(&[0, 0, 2, 2, 4]));
        assert_eq!(search(a, b, SearchSortedSide::Right), u32s(&[0, 2, 2, 4, 4]));
    }

    #[test]
    fn test_queries_cast_to_common_dtype() {
        let a = Column::from_iter_values("a", [1i64, 2, 3]).unwrap();
        let b = Column::from_iter_values("b", [1.5f64, 3.0]).unwrap();
        assert_eq!(search(a, b, SearchSortedSide::Left), u32s(&[1, 2]));
    }

    #[test]
    fn test_incomparable_query_dtype() {
        let a = Column::from_iter_values("a", [1i64, 2, 3]).unwrap();
        let b = Column::from_iter_values("b", ["x", "y", "z"]).unwrap();
        let err = search_sorted(&a, &b, SearchSortedSide::Left).unwrap_err();
        assert!(err.is_dtype_mismatch());
    }

    #[test]
    fn test_null_query_sorts_last() {
        let a = Column::from_iter_values("a", [Some(1i64), Some(2), Some(3), None]).unwrap();
        let b = Column::from_iter_values("b", [Some(1i64), None, Some(-1)]).unwrap();
        assert_eq!(search(a.clone(), b.clone(), SearchSortedSide::Left), u32s(&[0, 3, 0]));
        assert_eq!(search(a, b, SearchSortedSide::Right), u32s(&[1, 4, 0]));
    }
}
