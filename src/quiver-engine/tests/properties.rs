//! Property-based tests for quiver-engine.
//!
//! Chunk layout must never change logical results, and rank outputs keep
//! their structural guarantees for arbitrary inputs.

use proptest::prelude::*;

use quiver_core::{Batch, Column, DataType, Value};
use quiver_engine::LocalExecutor;
use quiver_logical::expr::{col, EwmOptions, RankMethod};

// =========================================================================
// Strategies
// =========================================================================

/// Nullable Int64 values split into 1..5 chunks.
fn arb_chunks() -> impl Strategy<Value = Vec<Vec<Option<i64>>>> {
    prop::collection::vec(prop::collection::vec(prop::option::of(-50i64..50), 0..8), 1..5)
}

fn chunked(name: &str, parts: &[Vec<Option<i64>>]) -> Column {
    let mut column = Column::empty(name, DataType::Int64);
    for part in parts {
        let piece = Column::from_iter_values(name, part.iter().copied()).unwrap();
        column = column.append(&piece).unwrap();
    }
    column
}

fn eval(expr: &quiver_logical::Expr, column: Column) -> Vec<Value> {
    let batch = Batch::new(vec![column]).unwrap();
    LocalExecutor::default()
        .evaluate(expr, &batch)
        .unwrap()
        .to_values()
        .unwrap()
}

fn floats(values: &[Value]) -> Vec<Option<f64>> {
    values.iter().map(Value::as_f64).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_coalesce_preserves_values(parts in arb_chunks()) {
        let column = chunked("x", &parts);
        let coalesced = column.coalesce().unwrap();
        prop_assert!(coalesced.n_chunks() <= 1);
        prop_assert_eq!(coalesced.to_values().unwrap(), column.to_values().unwrap());

        let flat: Vec<Value> = parts.iter().flatten().copied().map(Value::from).collect();
        prop_assert_eq!(column.to_values().unwrap(), flat);
    }

    #[test]
    fn prop_dense_rank_has_no_gaps(parts in arb_chunks(), descending in any::<bool>()) {
        let column = chunked("x", &parts);
        let input = column.to_values().unwrap();
        let ranks = eval(&col("x").rank(RankMethod::Dense, descending), column);

        let mut seen: Vec<u64> = Vec::new();
        for (value, rank) in input.iter().zip(&ranks) {
            prop_assert_eq!(value.is_null(), rank.is_null());
            if let Some(r) = rank.as_i64() {
                seen.push(r as u64);
            }
        }
        seen.sort_unstable();
        seen.dedup();
        let expected: Vec<u64> = (1..=seen.len() as u64).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_average_rank_of_ties(parts in arb_chunks()) {
        let column = chunked("x", &parts);
        let input: Vec<Option<i64>> = parts.iter().flatten().copied().collect();
        let ranks = floats(&eval(&col("x").rank(RankMethod::Average, false), column));

        let present: Vec<i64> = input.iter().flatten().copied().collect();
        for (value, rank) in input.iter().zip(ranks) {
            match value {
                None => prop_assert!(rank.is_none()),
                Some(v) => {
                    let below = present.iter().filter(|&&p| p < *v).count() as f64;
                    let ties = present.iter().filter(|&&p| p == *v).count() as f64;
                    // Mean of the ordinal ranks below+1 ..= below+ties.
                    let expected = below + (ties + 1.0) / 2.0;
                    prop_assert_eq!(rank, Some(expected));
                }
            }
        }
    }

    #[test]
    fn prop_ewm_std_ignores_chunking(parts in arb_chunks(), com in 0.0f64..5.0) {
        let column = chunked("x", &parts);
        let single = column.rechunk().unwrap();
        let options = EwmOptions::from_com(com).unwrap();
        let expr = col("x").ewm_std(options);

        let split = floats(&eval(&expr, column));
        let whole = floats(&eval(&expr, single));
        prop_assert_eq!(split.len(), whole.len());
        for (a, b) in split.into_iter().zip(whole) {
            match (a, b) {
                (None, None) => {}
                (Some(a), Some(b)) if a.is_nan() => prop_assert!(b.is_nan()),
                (Some(a), Some(b)) => prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0)),
                (a, b) => prop_assert!(false, "null mismatch: {:?} vs {:?}", a, b),
            }
        }
    }
}
