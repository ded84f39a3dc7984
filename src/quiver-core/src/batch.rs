//! Ordered sets of equal-length columns.

use common_error::{QuiverError, QuiverResult};

use crate::column::Column;
use crate::types::{DataType, Field};

/// An ordered set of named columns that all have the same length.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    columns: Vec<Column>,
    height: usize,
}

impl Batch {
    /// Create a batch. Column lengths must agree and names must be unique.
    pub fn new(columns: Vec<Column>) -> QuiverResult<Self> {
        let height = columns.first().map_or(0, Column::len);
        for (i, column) in columns.iter().enumerate() {
            if column.len() != height {
                return Err(QuiverError::length_mismatch(
                    format!("batch column '{}'", column.name()),
                    height,
                    column.len(),
                ));
            }
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(QuiverError::invalid_parameter(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        Ok(Self { columns, height })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume the batch, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> QuiverResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| QuiverError::unresolved_column(name, self.column_names()))
    }

    /// `(name, dtype)` of every column.
    pub fn schema(&self) -> Vec<Field> {
        self.columns
            .iter()
            .map(|c| Field::new(c.name(), c.dtype().clone()))
            .collect()
    }

    /// Dtype of the named column.
    pub fn dtype_of(&self, name: &str) -> QuiverResult<&DataType> {
        self.column(name).map(Column::dtype)
    }

    /// Gather rows of every column by index.
    pub fn take(&self, indices: &[u32]) -> QuiverResult<Self> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.take(indices))
            .collect::<QuiverResult<Vec<_>>>()?;
        Ok(Self {
            columns,
            height: indices.len(),
        })
    }

    /// Rows `[offset, offset + length)` of every column.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        let columns: Vec<Column> = self.columns.iter().map(|c| c.slice(offset, length)).collect();
        let height = columns.first().map_or(0, Column::len);
        Self { columns, height }
    }

    /// Add a column, replacing any existing column of the same name in place.
    pub fn with_column(&self, column: Column) -> QuiverResult<Self> {
        if !self.columns.is_empty() && column.len() != self.height {
            return Err(QuiverError::length_mismatch(
                format!("with_column '{}'", column.name()),
                self.height,
                column.len(),
            ));
        }
        let mut columns = self.columns.clone();
        match columns.iter().position(|c| c.name() == column.name()) {
            Some(i) => columns[i] = column,
            None => columns.push(column),
        }
        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn batch() -> Batch {
        Batch::new(vec![
            Column::from_iter_values("a", vec![1i64, 2, 3]).unwrap(),
            Column::from_iter_values("b", vec!["x", "y", "z"]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_unresolved_column() {
        let err = batch().column("c").unwrap_err();
        assert!(err.is_unresolved_column());
        assert!(err.to_string().contains("\"a\""));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = Batch::new(vec![
            Column::from_iter_values("a", vec![1i64, 2]).unwrap(),
            Column::from_iter_values("b", vec![1i64]).unwrap(),
        ])
        .unwrap_err();
        assert!(err.is_length_mismatch());
    }

    #[test]
    fn test_with_column_replaces() {
        let b = batch()
            .with_column(Column::from_iter_values("a", vec![9i64, 9, 9]).unwrap())
            .unwrap();
        assert_eq!(b.column_names(), vec!["a", "b"]);
        assert_eq!(b.column("a").unwrap().get(0).unwrap(), Value::Int64(9));
    }

    #[test]
    fn test_take_rows() {
        let b = batch().take(&[2, 0]).unwrap();
        assert_eq!(b.height(), 2);
        assert_eq!(b.column("b").unwrap().get(0).unwrap(), Value::from("z"));
        assert_eq!(b.schema()[1], Field::new("b", DataType::Utf8));
    }
}
