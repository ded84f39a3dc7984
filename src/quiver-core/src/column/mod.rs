//! Chunked, typed, null-aware columns.
//!
//! A [`Column`] is a logical sequence of values split into one or more Arrow
//! chunks. Every chunk carries the column's dtype; the logical length is the sum
//! of the chunk lengths. Operations return new columns and never mutate shared
//! chunks.

mod convert;

use std::sync::Arc;

use arrow::array::{new_empty_array, new_null_array, Array, ArrayRef, BooleanArray, UInt32Array};
use arrow::compute::{cast_with_options, concat, filter, take, CastOptions};
use common_error::{QuiverError, QuiverResult};

use crate::types::{check_type_invariants, DataType, Value};

pub(crate) use convert::values_to_array;

/// A named, typed, chunked column.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    dtype: DataType,
    chunks: Vec<ArrayRef>,
    length: usize,
}

impl Column {
    /// Create a column from Arrow chunks. Every chunk must have `dtype`.
    pub fn new(
        name: impl Into<String>,
        dtype: DataType,
        chunks: Vec<ArrayRef>,
    ) -> QuiverResult<Self> {
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_dtype = DataType::try_from_arrow(chunk.data_type())?;
            if chunk_dtype != dtype {
                return Err(QuiverError::dtype_mismatch(format!(
                    "chunk {i} has dtype {chunk_dtype}, column dtype is {dtype}"
                )));
            }
        }
        let length = chunks.iter().map(|c| c.len()).sum();
        Ok(Self {
            name: name.into(),
            dtype,
            chunks,
            length,
        })
    }

    /// Create a single-chunk column from an Arrow array.
    pub fn from_array(name: impl Into<String>, array: ArrayRef) -> QuiverResult<Self> {
        let dtype = DataType::try_from_arrow(array.data_type())?;
        Self::new(name, dtype, vec![array])
    }

    /// Create a column of `dtype` from scalars. Values of another dtype are cast.
    pub fn from_typed_values(
        name: impl Into<String>,
        dtype: DataType,
        values: &[Value],
    ) -> QuiverResult<Self> {
        let array = values_to_array(values, &dtype)?;
        Self::new(name, dtype, vec![array])
    }

    /// Create a column from scalars, inferring the dtype as the supertype of all values.
    pub fn from_values(name: impl Into<String>, values: &[Value]) -> QuiverResult<Self> {
        let dtype = infer_dtype(values)?;
        Self::from_typed_values(name, dtype, values)
    }

    /// Create a column from anything convertible to scalars.
    pub fn from_iter_values<I, V>(name: impl Into<String>, values: I) -> QuiverResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::from_values(name, &values)
    }

    /// A column of `len` nulls.
    pub fn full_null(name: impl Into<String>, dtype: DataType, len: usize) -> Self {
        let array = new_null_array(&dtype.to_arrow(), len);
        Self {
            name: name.into(),
            dtype,
            chunks: vec![array],
            length: len,
        }
    }

    /// A column repeating `value` `len` times.
    pub fn from_scalar(name: impl Into<String>, value: &Value, len: usize) -> QuiverResult<Self> {
        let dtype = value.dtype();
        if value.is_null() {
            return Ok(Self::full_null(name, dtype, len));
        }
        Self::from_typed_values(name, dtype, &vec![value.clone(); len])
    }

    /// An empty column.
    pub fn empty(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            chunks: Vec::new(),
            length: 0,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column dtype.
    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    /// Logical length (sum of chunk lengths).
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Physical chunks.
    pub fn chunks(&self) -> &[ArrayRef] {
        &self.chunks
    }

    /// Number of physical chunks.
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Lengths of the physical chunks, in order.
    pub fn chunk_lengths(&self) -> Vec<usize> {
        self.chunks.iter().map(|c| c.len()).collect()
    }

    /// Number of null entries.
    pub fn null_count(&self) -> usize {
        if self.dtype == DataType::Null {
            self.length
        } else {
            self.chunks.iter().map(|c| c.null_count()).sum()
        }
    }

    /// Return a copy with a new name.
    #[must_use]
    pub fn rename(&self, name: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.name = name.into();
        out
    }

    /// Read the value at logical position `index`.
    pub fn get(&self, index: usize) -> QuiverResult<Value> {
        let mut offset = index;
        for chunk in &self.chunks {
            if offset < chunk.len() {
                return convert::value_at(chunk.as_ref(), offset);
            }
            offset -= chunk.len();
        }
        Err(QuiverError::compute(format!(
            "index {index} out of bounds for column '{}' of length {}",
            self.name, self.length
        )))
    }

    /// Export all values in logical order.
    pub fn to_values(&self) -> QuiverResult<Vec<Value>> {
        let mut out = Vec::with_capacity(self.length);
        for chunk in &self.chunks {
            out.extend(convert::array_to_values(chunk.as_ref())?);
        }
        Ok(out)
    }

    /// Numeric values as nullable f64, one vector per chunk.
    pub fn chunk_f64(&self) -> QuiverResult<Vec<Vec<Option<f64>>>> {
        self.chunks
            .iter()
            .map(|c| convert::array_to_f64(c.as_ref()))
            .collect()
    }

    /// Numeric values as nullable f64 in logical order.
    pub fn to_f64(&self) -> QuiverResult<Vec<Option<f64>>> {
        Ok(self.chunk_f64()?.into_iter().flatten().collect())
    }

    /// The column as a single Arrow array.
    pub fn as_array(&self) -> QuiverResult<ArrayRef> {
        match self.chunks.as_slice() {
            [] => Ok(new_empty_array(&self.dtype.to_arrow())),
            [single] => Ok(Arc::clone(single)),
            chunks => {
                let refs: Vec<&dyn Array> = chunks.iter().map(AsRef::as_ref).collect();
                Ok(concat(&refs)?)
            }
        }
    }

    /// Append `other`'s chunks after this column's chunks without copying.
    ///
    /// A column of dtype `Null` adopts the dtype of the other side.
    pub fn append(&self, other: &Column) -> QuiverResult<Self> {
        let (left, right) = match (&self.dtype, &other.dtype) {
            (a, b) if a == b => (self.clone(), other.clone()),
            (DataType::Null, b) => (self.cast(b)?, other.clone()),
            (a, DataType::Null) => (self.clone(), other.cast(a)?),
            (a, b) => {
                return Err(QuiverError::dtype_mismatch(format!(
                    "cannot append {b} to column '{}' of dtype {a}",
                    self.name
                )))
            }
        };
        let mut chunks = left.chunks;
        chunks.extend(right.chunks);
        Ok(Self {
            name: left.name,
            dtype: left.dtype,
            chunks,
            length: self.length + other.length,
        })
    }

    /// Replace the physical chunking with a single chunk. Logical values are unchanged.
    pub fn rechunk(&self) -> QuiverResult<Self> {
        if self.chunks.len() == 1 {
            return Ok(self.clone());
        }
        Ok(Self {
            name: self.name.clone(),
            dtype: self.dtype.clone(),
            chunks: vec![self.as_array()?],
            length: self.length,
        })
    }

    /// Alias of [`Column::rechunk`].
    pub fn coalesce(&self) -> QuiverResult<Self> {
        self.rechunk()
    }

    /// Rows `[offset, offset + length)`, clamped to the column, across chunk boundaries.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        let start = offset.min(self.length);
        let end = start.saturating_add(length).min(self.length);
        let mut chunks = Vec::new();
        let mut chunk_start = 0;
        for chunk in &self.chunks {
            let chunk_end = chunk_start + chunk.len();
            if chunk_end > start && chunk_start < end {
                let lo = start.max(chunk_start) - chunk_start;
                let hi = end.min(chunk_end) - chunk_start;
                chunks.push(chunk.slice(lo, hi - lo));
            }
            chunk_start = chunk_end;
        }
        Self {
            name: self.name.clone(),
            dtype: self.dtype.clone(),
            chunks,
            length: end - start,
        }
    }

    /// Gather rows by index.
    pub fn take(&self, indices: &[u32]) -> QuiverResult<Self> {
        let indices = UInt32Array::from(indices.to_vec());
        self.take_array(&indices)
    }

    /// Gather rows by optional index; a `None` index yields null.
    pub fn take_opt(&self, indices: &[Option<u32>]) -> QuiverResult<Self> {
        let indices = UInt32Array::from(indices.to_vec());
        self.take_array(&indices)
    }

    fn take_array(&self, indices: &UInt32Array) -> QuiverResult<Self> {
        if let Some(bad) = indices.iter().flatten().find(|&i| i as usize >= self.length) {
            return Err(QuiverError::compute(format!(
                "take index {bad} out of bounds for column '{}' of length {}",
                self.name, self.length
            )));
        }
        let taken = take(self.as_array()?.as_ref(), indices, None)?;
        Ok(Self {
            name: self.name.clone(),
            dtype: self.dtype.clone(),
            length: taken.len(),
            chunks: vec![taken],
        })
    }

    /// Keep rows where `mask` is true. Null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanArray) -> QuiverResult<Self> {
        if mask.len() != self.length {
            return Err(QuiverError::length_mismatch(
                format!("filter on '{}'", self.name),
                self.length,
                mask.len(),
            ));
        }
        let mut chunks = Vec::with_capacity(self.chunks.len());
        let mut offset = 0;
        for chunk in &self.chunks {
            let part = mask.slice(offset, chunk.len());
            chunks.push(filter(chunk.as_ref(), &part)?);
            offset += chunk.len();
        }
        let length = chunks.iter().map(|c| c.len()).sum();
        Ok(Self {
            name: self.name.clone(),
            dtype: self.dtype.clone(),
            chunks,
            length,
        })
    }

    /// Cast every chunk to `dtype`. Lossy or invalid conversions fail.
    pub fn cast(&self, dtype: &DataType) -> QuiverResult<Self> {
        if &self.dtype == dtype {
            return Ok(self.clone());
        }
        if self.dtype == DataType::Null {
            return Ok(Self::full_null(self.name.clone(), dtype.clone(), self.length));
        }
        let target = dtype.to_arrow();
        let options = CastOptions {
            safe: false,
            ..Default::default()
        };
        let chunks = self
            .chunks
            .iter()
            .map(|c| {
                cast_with_options(c.as_ref(), &target, &options).map_err(|e| {
                    QuiverError::dtype_mismatch(format!(
                        "cannot cast '{}' from {} to {dtype}: {e}",
                        self.name, self.dtype
                    ))
                })
            })
            .collect::<QuiverResult<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            dtype: dtype.clone(),
            chunks,
            length: self.length,
        })
    }

    /// Repeat a length-1 column to `len` rows. Columns already of length `len` are returned as is.
    pub fn broadcast(&self, len: usize) -> QuiverResult<Self> {
        if self.length == len {
            return Ok(self.clone());
        }
        if self.length != 1 {
            return Err(QuiverError::length_mismatch(
                format!("broadcast of '{}'", self.name),
                self.length,
                len,
            ));
        }
        self.take(&vec![0; len])
    }

    /// Rows in reverse order.
    pub fn reverse(&self) -> QuiverResult<Self> {
        let len = u32::try_from(self.length)
            .map_err(|_| QuiverError::compute("column too long to reverse"))?;
        let indices: Vec<u32> = (0..len).rev().collect();
        self.take(&indices)
    }

    /// Validity of every row; `true` where the value is present.
    pub fn validity(&self) -> Vec<bool> {
        if self.dtype == DataType::Null {
            return vec![false; self.length];
        }
        let mut out = Vec::with_capacity(self.length);
        for chunk in &self.chunks {
            out.extend((0..chunk.len()).map(|i| chunk.is_valid(i)));
        }
        out
    }

    /// Check every value against the column dtype.
    pub fn validate(&self) -> QuiverResult<()> {
        for value in self.to_values()? {
            check_type_invariants(&value, &self.dtype)?;
        }
        Ok(())
    }
}

/// Supertype of all non-null value dtypes, `Null` if there are none.
pub fn infer_dtype(values: &[Value]) -> QuiverResult<DataType> {
    let mut dtype = DataType::Null;
    for v in values.iter().filter(|v| !v.is_null()) {
        let vt = v.dtype();
        dtype = dtype.supertype(&vt).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!("cannot combine {dtype} and {vt} in one column"))
        })?;
    }
    Ok(dtype)
}
