//! Data type definitions and the numeric promotion order.

use std::sync::Arc;

use arrow::datatypes::{
    DataType as ArrowDataType, Field as ArrowField, Fields, TimeUnit as ArrowTimeUnit,
};
use common_error::{QuiverError, QuiverResult};
use serde::{Deserialize, Serialize};

/// Resolution of temporal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Milliseconds.
    Milliseconds,
    /// Microseconds.
    Microseconds,
    /// Nanoseconds.
    Nanoseconds,
}

impl TimeUnit {
    /// Number of nanoseconds in one tick of this unit.
    pub const fn nanos_per_tick(self) -> i64 {
        match self {
            Self::Milliseconds => 1_000_000,
            Self::Microseconds => 1_000,
            Self::Nanoseconds => 1,
        }
    }

    /// Convert `value` expressed in `self` into `target` ticks.
    ///
    /// Converting to a coarser unit floors toward negative infinity.
    pub fn convert(self, value: i64, target: Self) -> QuiverResult<i64> {
        let from = self.nanos_per_tick();
        let to = target.nanos_per_tick();
        if from == to {
            Ok(value)
        } else if from > to {
            value.checked_mul(from / to).ok_or_else(|| {
                QuiverError::compute(format!(
                    "overflow converting {value} from {self} to {target}"
                ))
            })
        } else {
            Ok(value.div_euclid(to / from))
        }
    }

    /// Short unit name as used in dtype display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Milliseconds => "ms",
            Self::Microseconds => "us",
            Self::Nanoseconds => "ns",
        }
    }

    fn to_arrow(self) -> ArrowTimeUnit {
        match self {
            Self::Milliseconds => ArrowTimeUnit::Millisecond,
            Self::Microseconds => ArrowTimeUnit::Microsecond,
            Self::Nanoseconds => ArrowTimeUnit::Nanosecond,
        }
    }

    fn try_from_arrow(unit: &ArrowTimeUnit) -> QuiverResult<Self> {
        match unit {
            ArrowTimeUnit::Millisecond => Ok(Self::Milliseconds),
            ArrowTimeUnit::Microsecond => Ok(Self::Microseconds),
            ArrowTimeUnit::Nanosecond => Ok(Self::Nanoseconds),
            ArrowTimeUnit::Second => Err(QuiverError::dtype_mismatch(
                "second-resolution temporal data is not supported",
            )),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed field of a struct dtype or a batch schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field dtype.
    pub dtype: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// Logical dtype of a column.
///
/// The set is closed; every operation dispatches over it with an exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (every value missing, dtype not yet known).
    Null,
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Instant since the Unix epoch with an optional zone identity.
    Datetime(TimeUnit, Option<String>),
    /// Elapsed time.
    Duration(TimeUnit),
    /// Variable-length list of the inner dtype.
    List(Box<DataType>),
    /// Struct of named fields.
    Struct(Vec<Field>),
}

impl DataType {
    /// Check if this type is a signed integer.
    pub const fn is_signed_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Check if this type is an unsigned integer.
    pub const fn is_unsigned_integer(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    /// Check if this type is an integer of any signedness.
    pub const fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Check if this type is a float.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Check if this type is temporal.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Datetime(..) | Self::Duration(_))
    }

    /// Check if this type is nested.
    pub const fn is_nested(&self) -> bool {
        matches!(self, Self::List(_) | Self::Struct(_))
    }

    /// Bit width of an integer or float type.
    pub const fn bit_width(&self) -> Option<u32> {
        match self {
            Self::Int8 | Self::UInt8 => Some(8),
            Self::Int16 | Self::UInt16 => Some(16),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(32),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(64),
            _ => None,
        }
    }

    /// Inner dtype of a list.
    pub fn list_inner(&self) -> Option<&DataType> {
        match self {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Get the display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            Self::Null => "Null".to_string(),
            Self::Boolean => "Boolean".to_string(),
            Self::Int8 => "Int8".to_string(),
            Self::Int16 => "Int16".to_string(),
            Self::Int32 => "Int32".to_string(),
            Self::Int64 => "Int64".to_string(),
            Self::UInt8 => "UInt8".to_string(),
            Self::UInt16 => "UInt16".to_string(),
            Self::UInt32 => "UInt32".to_string(),
            Self::UInt64 => "UInt64".to_string(),
            Self::Float32 => "Float32".to_string(),
            Self::Float64 => "Float64".to_string(),
            Self::Utf8 => "Utf8".to_string(),
            Self::Datetime(unit, None) => format!("Datetime({unit})"),
            Self::Datetime(unit, Some(tz)) => format!("Datetime({unit}, {tz})"),
            Self::Duration(unit) => format!("Duration({unit})"),
            Self::List(inner) => format!("List<{}>", inner.display_name()),
            Self::Struct(fields) => {
                let inner = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.dtype.display_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Struct{{{inner}}}")
            }
        }
    }

    /// Common dtype two operands are promoted to before they are combined.
    ///
    /// Returns `None` when no common dtype exists.
    pub fn supertype(&self, other: &Self) -> Option<Self> {
        if self == other {
            return Some(self.clone());
        }

        match (self, other) {
            (Self::Null, t) | (t, Self::Null) => Some(t.clone()),
            (Self::Boolean, t) | (t, Self::Boolean) if t.is_numeric() => Some(t.clone()),
            (a, b) if a.is_integer() && b.is_integer() => Some(integer_supertype(a, b)),
            (Self::Float32, Self::Float64) | (Self::Float64, Self::Float32) => Some(Self::Float64),
            (i, f) | (f, i) if i.is_integer() && f.is_float() => {
                let narrow = i.bit_width().is_some_and(|w| w <= 16);
                if narrow && *f == Self::Float32 {
                    Some(Self::Float32)
                } else {
                    Some(Self::Float64)
                }
            }
            (Self::Datetime(u1, tz1), Self::Datetime(u2, tz2)) => {
                if tz1 == tz2 {
                    Some(Self::Datetime((*u1).max(*u2), tz1.clone()))
                } else {
                    None
                }
            }
            (Self::Duration(u1), Self::Duration(u2)) => Some(Self::Duration((*u1).max(*u2))),
            (Self::List(a), Self::List(b)) => a.supertype(b).map(|t| Self::List(Box::new(t))),
            _ => None,
        }
    }

    /// Convert to the Arrow physical type used for chunks of this dtype.
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            Self::Null => ArrowDataType::Null,
            Self::Boolean => ArrowDataType::Boolean,
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::UInt8 => ArrowDataType::UInt8,
            Self::UInt16 => ArrowDataType::UInt16,
            Self::UInt32 => ArrowDataType::UInt32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::Utf8 => ArrowDataType::Utf8,
            Self::Datetime(unit, tz) => {
                ArrowDataType::Timestamp(unit.to_arrow(), tz.as_deref().map(Arc::from))
            }
            Self::Duration(unit) => ArrowDataType::Duration(unit.to_arrow()),
            Self::List(inner) => ArrowDataType::List(Arc::new(ArrowField::new(
                "item",
                inner.to_arrow(),
                true,
            ))),
            Self::Struct(fields) => ArrowDataType::Struct(Fields::from(
                fields
                    .iter()
                    .map(|f| ArrowField::new(f.name.clone(), f.dtype.to_arrow(), true))
                    .collect::<Vec<_>>(),
            )),
        }
    }

    /// Convert an Arrow type back into a dtype.
    pub fn try_from_arrow(dt: &ArrowDataType) -> QuiverResult<Self> {
        Ok(match dt {
            ArrowDataType::Null => Self::Null,
            ArrowDataType::Boolean => Self::Boolean,
            ArrowDataType::Int8 => Self::Int8,
            ArrowDataType::Int16 => Self::Int16,
            ArrowDataType::Int32 => Self::Int32,
            ArrowDataType::Int64 => Self::Int64,
            ArrowDataType::UInt8 => Self::UInt8,
            ArrowDataType::UInt16 => Self::UInt16,
            ArrowDataType::UInt32 => Self::UInt32,
            ArrowDataType::UInt64 => Self::UInt64,
            ArrowDataType::Float32 => Self::Float32,
            ArrowDataType::Float64 => Self::Float64,
            ArrowDataType::Utf8 => Self::Utf8,
            ArrowDataType::Timestamp(unit, tz) => Self::Datetime(
                TimeUnit::try_from_arrow(unit)?,
                tz.as_ref().map(|t| t.to_string()),
            ),
            ArrowDataType::Duration(unit) => Self::Duration(TimeUnit::try_from_arrow(unit)?),
            ArrowDataType::List(field) => {
                Self::List(Box::new(Self::try_from_arrow(field.data_type())?))
            }
            ArrowDataType::Struct(fields) => Self::Struct(
                fields
                    .iter()
                    .map(|f| Ok(Field::new(f.name().clone(), Self::try_from_arrow(f.data_type())?)))
                    .collect::<QuiverResult<Vec<_>>>()?,
            ),
            other => {
                return Err(QuiverError::dtype_mismatch(format!(
                    "unsupported arrow type {other:?}"
                )))
            }
        })
    }
}

/// Integer promotion: same signedness widens, mixed signedness moves to a signed
/// type wide enough for both, and `UInt64` mixed with signed falls back to `Float64`.
fn integer_supertype(a: &DataType, b: &DataType) -> DataType {
    let wa = a.bit_width().unwrap_or(64);
    let wb = b.bit_width().unwrap_or(64);
    match (a.is_signed_integer(), b.is_signed_integer()) {
        (true, true) => signed_of_width(wa.max(wb)),
        (false, false) => unsigned_of_width(wa.max(wb)),
        (signed_a, _) => {
            let (ws, wu) = if signed_a { (wa, wb) } else { (wb, wa) };
            if ws > wu {
                signed_of_width(ws)
            } else if wu < 64 {
                signed_of_width(wu * 2)
            } else {
                DataType::Float64
            }
        }
    }
}

fn signed_of_width(width: u32) -> DataType {
    match width {
        8 => DataType::Int8,
        16 => DataType::Int16,
        32 => DataType::Int32,
        _ => DataType::Int64,
    }
}

fn unsigned_of_width(width: u32) -> DataType {
    match width {
        8 => DataType::UInt8,
        16 => DataType::UInt16,
        32 => DataType::UInt32,
        _ => DataType::UInt64,
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_promotion() {
        assert_eq!(DataType::Int8.supertype(&DataType::Int32), Some(DataType::Int32));
        assert_eq!(DataType::UInt8.supertype(&DataType::UInt16), Some(DataType::UInt16));
        assert_eq!(DataType::UInt8.supertype(&DataType::Int8), Some(DataType::Int16));
        assert_eq!(DataType::UInt32.supertype(&DataType::Int64), Some(DataType::Int64));
        assert_eq!(DataType::UInt64.supertype(&DataType::Int64), Some(DataType::Float64));
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(DataType::Int16.supertype(&DataType::Float32), Some(DataType::Float32));
        assert_eq!(DataType::Int32.supertype(&DataType::Float32), Some(DataType::Float64));
        assert_eq!(DataType::Int64.supertype(&DataType::Float64), Some(DataType::Float64));
        assert_eq!(DataType::Float32.supertype(&DataType::Float64), Some(DataType::Float64));
    }

    #[test]
    fn test_null_and_incompatible() {
        assert_eq!(DataType::Null.supertype(&DataType::Utf8), Some(DataType::Utf8));
        assert_eq!(DataType::Utf8.supertype(&DataType::Int64), None);
        let a = DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into()));
        let b = DataType::Datetime(TimeUnit::Microseconds, Some("Asia/Kathmandu".into()));
        assert_eq!(a.supertype(&b), None);
    }

    #[test]
    fn test_temporal_supertype_picks_finer_unit() {
        let a = DataType::Duration(TimeUnit::Milliseconds);
        let b = DataType::Duration(TimeUnit::Nanoseconds);
        assert_eq!(a.supertype(&b), Some(DataType::Duration(TimeUnit::Nanoseconds)));
    }

    #[test]
    fn test_arrow_roundtrip() {
        let dtypes = vec![
            DataType::UInt16,
            DataType::Datetime(TimeUnit::Nanoseconds, Some("Asia/Kathmandu".into())),
            DataType::Duration(TimeUnit::Milliseconds),
            DataType::List(Box::new(DataType::Utf8)),
            DataType::Struct(vec![
                Field::new("a", DataType::Int64),
                Field::new("b", DataType::Boolean),
            ]),
        ];
        for dt in dtypes {
            assert_eq!(DataType::try_from_arrow(&dt.to_arrow()).unwrap(), dt);
        }
    }

    #[test]
    fn test_unit_conversion_floors() {
        assert_eq!(
            TimeUnit::Microseconds.convert(1_987_654, TimeUnit::Milliseconds).unwrap(),
            1_987
        );
        assert_eq!(TimeUnit::Microseconds.convert(-1, TimeUnit::Milliseconds).unwrap(), -1);
        assert_eq!(TimeUnit::Milliseconds.convert(3, TimeUnit::Nanoseconds).unwrap(), 3_000_000);
        assert!(TimeUnit::Milliseconds.convert(i64::MAX, TimeUnit::Nanoseconds).is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into())).display_name(),
            "Datetime(us, UTC)"
        );
        assert_eq!(DataType::List(Box::new(DataType::Int64)).display_name(), "List<Int64>");
    }
}
