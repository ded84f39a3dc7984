//! Property-based tests for quiver-core.
//!
//! Strategies for dtypes, scalars and arbitrarily chunked columns.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::column::Column;
    use crate::types::{DataType, TimeUnit, Value};

    // =========================================================================
    // Arbitrary Strategies for DataType / Value
    // =========================================================================

    fn arb_scalar_type() -> impl Strategy<Value = DataType> {
        prop_oneof![
            Just(DataType::Null),
            Just(DataType::Boolean),
            Just(DataType::Int8),
            Just(DataType::Int16),
            Just(DataType::Int32),
            Just(DataType::Int64),
            Just(DataType::UInt8),
            Just(DataType::UInt16),
            Just(DataType::UInt32),
            Just(DataType::UInt64),
            Just(DataType::Float32),
            Just(DataType::Float64),
            Just(DataType::Utf8),
            Just(DataType::Duration(TimeUnit::Milliseconds)),
            Just(DataType::Duration(TimeUnit::Nanoseconds)),
            Just(DataType::Datetime(TimeUnit::Microseconds, None)),
        ]
    }

    /// Scalars that roundtrip through JSON (integer-valued floats only).
    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Boolean),
            any::<i8>().prop_map(Value::Int8),
            any::<i64>().prop_map(Value::Int64),
            any::<u32>().prop_map(Value::UInt32),
            any::<i32>().prop_map(|i| Value::Float64(f64::from(i))),
            "[a-zA-Z0-9]{0,20}".prop_map(Value::Utf8),
            any::<i64>().prop_map(|t| Value::Duration(t, TimeUnit::Microseconds)),
        ]
    }

    /// A nullable Int64 column split into 1..5 chunks.
    fn arb_chunked_column() -> impl Strategy<Value = Column> {
        prop::collection::vec(
            prop::collection::vec(prop::option::of(-1000i64..1000), 0..8),
            1..5,
        )
        .prop_map(|parts| {
            let mut column = Column::empty("x", DataType::Int64);
            for part in parts {
                let values: Vec<Value> = part.into_iter().map(Value::from).collect();
                let next = Column::from_typed_values("x", DataType::Int64, &values).unwrap();
                column = column.append(&next).unwrap();
            }
            column
        })
    }

    // =========================================================================
    // Property Tests
    // =========================================================================

    proptest! {
        /// Coalescing chunks never changes logical values.
        #[test]
        fn coalesce_preserves_values(column in arb_chunked_column()) {
            let single = column.coalesce().unwrap();
            prop_assert!(single.n_chunks() <= 1);
            prop_assert_eq!(single.len(), column.len());
            prop_assert_eq!(single.to_values().unwrap(), column.to_values().unwrap());
        }

        /// Slicing a chunked column reads the same rows as slicing its coalesced form.
        #[test]
        fn slice_ignores_chunking(
            column in arb_chunked_column(),
            offset in 0usize..40,
            length in 0usize..40,
        ) {
            let single = column.coalesce().unwrap();
            prop_assert_eq!(
                column.slice(offset, length).to_values().unwrap(),
                single.slice(offset, length).to_values().unwrap()
            );
        }

        /// Random access agrees with a full export.
        #[test]
        fn get_matches_to_values(column in arb_chunked_column()) {
            let values = column.to_values().unwrap();
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(&column.get(i).unwrap(), v);
            }
        }

        /// Value serialization roundtrips.
        #[test]
        fn value_serde_roundtrip(value in arb_value()) {
            let serialized = serde_json::to_string(&value).unwrap();
            let deserialized: Value = serde_json::from_str(&serialized).unwrap();
            prop_assert_eq!(value, deserialized);
        }

        /// DataType serialization roundtrips.
        #[test]
        fn data_type_serde_roundtrip(dt in arb_scalar_type()) {
            let serialized = serde_json::to_string(&dt).unwrap();
            let deserialized: DataType = serde_json::from_str(&serialized).unwrap();
            prop_assert_eq!(dt, deserialized);
        }

        /// Promotion is symmetric.
        #[test]
        fn supertype_symmetric(a in arb_scalar_type(), b in arb_scalar_type()) {
            prop_assert_eq!(a.supertype(&b), b.supertype(&a));
        }

        /// Values of both operands survive a cast to their supertype.
        #[test]
        fn supertype_holds_both(a in any::<i16>(), b in any::<u8>()) {
            let target = DataType::Int16.supertype(&DataType::UInt8).unwrap();
            prop_assert!(Value::Int16(a).cast(&target).is_ok());
            prop_assert!(Value::UInt8(b).cast(&target).is_ok());
        }
    }
}
