//! Ranking.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array};
use common_error::{QuiverError, QuiverResult};
use quiver_core::types::check_orderable;
use quiver_core::{Column, Value};
use quiver_logical::expr::{RankMethod, RankOptions};

/// Rank every non-null value among the non-null values, starting at 1.
///
/// Nulls keep a null rank and do not consume rank positions. Ties are resolved
/// by `options.method`; `Ordinal` breaks ties by row order.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn rank(input: &Column, options: RankOptions) -> QuiverResult<Column> {
    check_orderable(input.dtype(), "rank")?;
    let values = input.to_values()?;
    let mut order: Vec<usize> = (0..values.len()).filter(|&i| !values[i].is_null()).collect();
    // Stable sort keeps row order among ties in both directions.
    if options.descending {
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    } else {
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    }

    let mut ranks: Vec<Option<f64>> = vec![None; values.len()];
    let mut dense = 0usize;
    let mut start = 0usize;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && tied(&values[order[start]], &values[order[end]]) {
            end += 1;
        }
        dense += 1;
        for (offset, &row) in order[start..end].iter().enumerate() {
            let r = match options.method {
                RankMethod::Average => (start + 1 + end) as f64 / 2.0,
                RankMethod::Min => (start + 1) as f64,
                RankMethod::Max => end as f64,
                RankMethod::Dense => dense as f64,
                RankMethod::Ordinal => (start + 1 + offset) as f64,
            };
            ranks[row] = Some(r);
        }
        start = end;
    }

    let out: ArrayRef = match options.method {
        RankMethod::Average => Arc::new(Float64Array::from(ranks)),
        _ => Arc::new(
            ranks
                .into_iter()
                .map(|r| r.map(to_u32).transpose())
                .collect::<QuiverResult<UInt32Array>>()?,
        ),
    };
    Column::from_array(input.name(), out)
}

fn tied(a: &Value, b: &Value) -> bool {
    a.total_cmp(b).is_eq()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(rank: f64) -> QuiverResult<u32> {
    if rank > f64::from(u32::MAX) {
        return Err(QuiverError::compute("rank exceeds UInt32 range"));
    }
    Ok(rank as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::DataType;

    fn opts(method: RankMethod, descending: bool) -> RankOptions {
        RankOptions { method, descending }
    }

    #[test]
    fn test_rank_methods_with_ties() {
        let col = Column::from_iter_values("a", [3i64, 1, 3, 2]).unwrap();
        let get = |m| rank(&col, opts(m, false)).unwrap().to_values().unwrap();
        assert_eq!(
            get(RankMethod::Average),
            vec![Value::Float64(3.5), Value::Float64(1.0), Value::Float64(3.5), Value::Float64(2.0)]
        );
        assert_eq!(
            get(RankMethod::Min),
            vec![Value::UInt32(3), Value::UInt32(1), Value::UInt32(3), Value::UInt32(2)]
        );
        assert_eq!(
            get(RankMethod::Max),
            vec![Value::UInt32(4), Value::UInt32(1), Value::UInt32(4), Value::UInt32(2)]
        );
        assert_eq!(
            get(RankMethod::Dense),
            vec![Value::UInt32(3), Value::UInt32(1), Value::UInt32(3), Value::UInt32(2)]
        );
        assert_eq!(
            get(RankMethod::Ordinal),
            vec![Value::UInt32(3), Value::UInt32(1), Value::UInt32(4), Value::UInt32(2)]
        );
    }

    #[test]
    fn test_rank_skips_nulls() {
        let col = Column::from_iter_values("a", [Some(1i64), None, Some(1), Some(2)]).unwrap();
        let dense = rank(&col, opts(RankMethod::Dense, false)).unwrap();
        assert_eq!(*dense.dtype(), DataType::UInt32);
        assert_eq!(
            dense.to_values().unwrap(),
            vec![Value::UInt32(1), Value::Null, Value::UInt32(1), Value::UInt32(2)]
        );
        let avg = rank(&col, opts(RankMethod::Average, false)).unwrap();
        assert_eq!(
            avg.to_values().unwrap(),
            vec![Value::Float64(1.5), Value::Null, Value::Float64(1.5), Value::Float64(3.0)]
        );
    }

    #[test]
    fn test_rank_descending() {
        let col = Column::from_iter_values("a", [10i64, 30, 20]).unwrap();
        let out = rank(&col, opts(RankMethod::Ordinal, true)).unwrap();
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::UInt32(3), Value::UInt32(1), Value::UInt32(2)]
        );
    }
}
