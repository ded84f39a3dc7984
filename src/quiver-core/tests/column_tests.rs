//! Integration tests for the typed column store.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use quiver_core::{Batch, Column, DataType, RowKey, TimeUnit, Value};

#[test]
fn test_column_from_arrow_chunks() {
    let chunks: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![Some(1), None])),
        Arc::new(Int64Array::from(vec![3])),
    ];
    let column = Column::new("a", DataType::Int64, chunks).unwrap();
    assert_eq!(column.len(), 3);
    assert_eq!(column.n_chunks(), 2);
    assert_eq!(
        column.to_values().unwrap(),
        vec![Value::Int64(1), Value::Null, Value::Int64(3)]
    );
}

#[test]
fn test_column_rejects_mixed_chunk_dtypes() {
    let chunks: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1])),
        Arc::new(StringArray::from(vec!["x"])),
    ];
    let err = Column::new("a", DataType::Int64, chunks).unwrap_err();
    assert!(err.is_dtype_mismatch());
}

#[test]
fn test_append_then_coalesce_keeps_order() {
    let a = Column::from_iter_values("s", vec!["a", "b"]).unwrap();
    let b = Column::from_iter_values("s", vec![Some("c"), None]).unwrap();
    let appended = a.append(&b).unwrap().append(&a).unwrap();
    assert_eq!(appended.n_chunks(), 3);

    let coalesced = appended.coalesce().unwrap();
    assert_eq!(coalesced.n_chunks(), 1);
    assert_eq!(coalesced.to_values().unwrap(), appended.to_values().unwrap());
    assert_eq!(coalesced.get(2).unwrap(), Value::from("c"));
}

#[test]
fn test_datetime_column_roundtrip() {
    let tz = Some("Asia/Kathmandu".to_string());
    let dtype = DataType::Datetime(TimeUnit::Microseconds, tz.clone());
    let naive = Value::Datetime(1_000, TimeUnit::Microseconds, None);
    let column = Column::from_typed_values("t", dtype.clone(), &[naive, Value::Null]).unwrap();
    assert_eq!(column.dtype(), &dtype);
    assert_eq!(
        column.get(0).unwrap(),
        Value::Datetime(1_000, TimeUnit::Microseconds, tz)
    );
}

#[test]
fn test_scalar_and_null_columns() {
    let scalar = Column::from_scalar("lit", &Value::Float32(1.5), 3).unwrap();
    assert_eq!(scalar.len(), 3);
    assert_eq!(scalar.null_count(), 0);

    let nulls = Column::full_null("n", DataType::Utf8, 2);
    assert_eq!(nulls.null_count(), 2);
    assert_eq!(nulls.to_values().unwrap(), vec![Value::Null, Value::Null]);
}

#[test]
fn test_batch_row_keys() {
    let batch = Batch::new(vec![
        Column::from_iter_values("k", vec!["a", "b", "a"]).unwrap(),
        Column::from_iter_values("v", vec![1i32, 2, 3]).unwrap(),
    ])
    .unwrap();
    let keys = RowKey::rows(&[batch.column("k").unwrap().clone()]).unwrap();
    assert_eq!(keys[0], keys[2]);
    assert_eq!(keys[1].values(), &[Value::from("b")]);
}
