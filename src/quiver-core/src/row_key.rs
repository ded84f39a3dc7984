//! Hashable row keys.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use common_error::QuiverResult;

use crate::column::Column;
use crate::types::Value;

/// A tuple of values usable as a hash-map key.
///
/// Floats compare by canonical bit pattern, so `NaN == NaN` and `-0.0 == 0.0`,
/// and nulls are equal to each other.
#[derive(Debug, Clone)]
pub struct RowKey(pub Vec<Value>);

impl RowKey {
    /// Key made of a single value.
    pub fn single(value: Value) -> Self {
        Self(vec![value])
    }

    /// Key of row `row` across `columns`.
    pub fn from_columns(columns: &[Column], row: usize) -> QuiverResult<Self> {
        columns
            .iter()
            .map(|c| c.get(row))
            .collect::<QuiverResult<Vec<_>>>()
            .map(Self)
    }

    /// All row keys of `columns`, in row order.
    pub fn rows(columns: &[Column]) -> QuiverResult<Vec<Self>> {
        let height = columns.first().map_or(0, Column::len);
        let values = columns
            .iter()
            .map(Column::to_values)
            .collect::<QuiverResult<Vec<_>>>()?;
        Ok((0..height)
            .map(|row| Self(values.iter().map(|col| col[row].clone()).collect()))
            .collect())
    }

    /// Values of this key.
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl PartialEq for RowKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RowKey {}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            let ord = a.total_cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl Hash for RowKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for v in &self.0 {
            v.hash_canonical(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_nan_and_null_keys_collapse() {
        let mut set = HashSet::new();
        set.insert(RowKey::single(Value::Float64(f64::NAN)));
        set.insert(RowKey::single(Value::Float64(-f64::NAN)));
        set.insert(RowKey::single(Value::Null));
        set.insert(RowKey::single(Value::Null));
        set.insert(RowKey::single(Value::Float64(0.0)));
        set.insert(RowKey::single(Value::Float64(-0.0)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_rows_from_columns() {
        let a = Column::from_iter_values("a", vec!["x", "y", "x"]).unwrap();
        let b = Column::from_iter_values("b", vec![Some(1i64), None, Some(1)]).unwrap();
        let keys = RowKey::rows(&[a, b]).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], keys[2]);
        assert_ne!(keys[0], keys[1]);
    }
}
