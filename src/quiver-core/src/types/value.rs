//! Runtime scalar representation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common_error::{QuiverError, QuiverResult};
use serde::{Deserialize, Serialize};

use super::{DataType, Field, TimeUnit};

/// A single nullable scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 8-bit unsigned integer.
    UInt8(u8),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Ticks since the Unix epoch, with unit and optional zone.
    Datetime(i64, TimeUnit, Option<String>),
    /// Elapsed ticks.
    Duration(i64, TimeUnit),
    /// A list cell. `inner` is kept so empty lists stay typed.
    List {
        /// Element dtype.
        inner: DataType,
        /// Elements.
        values: Vec<Value>,
    },
    /// A struct row.
    Struct {
        /// Field definitions.
        fields: Vec<Field>,
        /// One value per field.
        values: Vec<Value>,
    },
}

/// Numeric view used by casts.
#[derive(Clone, Copy)]
enum Num {
    Int(i128),
    Float(f64),
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Build a list value.
    pub fn list(inner: DataType, values: Vec<Value>) -> Self {
        Self::List { inner, values }
    }

    /// The dtype of this value. `Null` reports `DataType::Null`.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::Datetime(_, unit, tz) => DataType::Datetime(*unit, tz.clone()),
            Self::Duration(_, unit) => DataType::Duration(*unit),
            Self::List { inner, .. } => DataType::List(Box::new(inner.clone())),
            Self::Struct { fields, .. } => DataType::Struct(fields.clone()),
        }
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get any integer as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self.as_num()? {
            Num::Int(i) => i64::try_from(i).ok(),
            Num::Float(_) => None,
        }
    }

    /// Try to get any numeric value as f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Boolean(_) => None,
            _ => match self.as_num()? {
                Num::Int(i) => Some(i as f64),
                Num::Float(f) => Some(f),
            },
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the elements of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List { values, .. } => Some(values),
            _ => None,
        }
    }

    fn as_num(&self) -> Option<Num> {
        Some(match self {
            Self::Boolean(b) => Num::Int(i128::from(*b)),
            Self::Int8(v) => Num::Int(i128::from(*v)),
            Self::Int16(v) => Num::Int(i128::from(*v)),
            Self::Int32(v) => Num::Int(i128::from(*v)),
            Self::Int64(v) => Num::Int(i128::from(*v)),
            Self::UInt8(v) => Num::Int(i128::from(*v)),
            Self::UInt16(v) => Num::Int(i128::from(*v)),
            Self::UInt32(v) => Num::Int(i128::from(*v)),
            Self::UInt64(v) => Num::Int(i128::from(*v)),
            Self::Float32(v) => Num::Float(f64::from(*v)),
            Self::Float64(v) => Num::Float(*v),
            _ => return None,
        })
    }

    /// Cast this value to `target`.
    ///
    /// Integer narrowing is checked. Temporal unit changes floor toward negative
    /// infinity. A naive instant cast to a zoned dtype takes on that zone, while a
    /// zoned instant cast to a *different* zone is a `DtypeMismatch`.
    pub fn cast(&self, target: &DataType) -> QuiverResult<Value> {
        if self.is_null() {
            return Ok(Self::Null);
        }
        let source = self.dtype();
        if &source == target {
            return Ok(self.clone());
        }

        let mismatch = || {
            QuiverError::dtype_mismatch(format!("cannot cast {self} ({source}) to {target}"))
        };

        match (self, target) {
            (Self::Datetime(ticks, unit, tz), DataType::Datetime(to_unit, to_tz)) => {
                let zone = match (tz, to_tz) {
                    (Some(from), Some(to)) if from != to => {
                        return Err(QuiverError::dtype_mismatch(format!(
                            "cannot cast instant in zone '{from}' to {target}: zone is already set"
                        )))
                    }
                    (Some(from), _) => Some(from.clone()),
                    (None, to) => to.clone(),
                };
                Ok(Self::Datetime(unit.convert(*ticks, *to_unit)?, *to_unit, zone))
            }
            (Self::Duration(ticks, unit), DataType::Duration(to_unit)) => {
                Ok(Self::Duration(unit.convert(*ticks, *to_unit)?, *to_unit))
            }
            (Self::Datetime(ticks, ..) | Self::Duration(ticks, _), t) if t.is_integer() => {
                Self::Int64(*ticks).cast(t)
            }
            (v, DataType::Datetime(unit, tz)) if v.dtype().is_integer() => {
                let ticks = v.as_i64().ok_or_else(mismatch)?;
                Ok(Self::Datetime(ticks, *unit, tz.clone()))
            }
            (v, DataType::Duration(unit)) if v.dtype().is_integer() => {
                let ticks = v.as_i64().ok_or_else(mismatch)?;
                Ok(Self::Duration(ticks, *unit))
            }
            (Self::Utf8(s), t) => parse_str(s, t).ok_or_else(mismatch),
            (v, DataType::Utf8) if !v.dtype().is_nested() => Ok(Self::Utf8(v.to_string())),
            (Self::List { values, .. }, DataType::List(inner)) => Ok(Self::List {
                inner: (**inner).clone(),
                values: values
                    .iter()
                    .map(|v| v.cast(inner))
                    .collect::<QuiverResult<_>>()?,
            }),
            (Self::Struct { fields, values }, DataType::Struct(to_fields))
                if fields.len() == to_fields.len()
                    && fields.iter().zip(to_fields).all(|(a, b)| a.name == b.name) =>
            {
                Ok(Self::Struct {
                    fields: to_fields.clone(),
                    values: values
                        .iter()
                        .zip(to_fields)
                        .map(|(v, f)| v.cast(&f.dtype))
                        .collect::<QuiverResult<_>>()?,
                })
            }
            (v, t) => {
                let num = v.as_num().ok_or_else(mismatch)?;
                num_to_value(num, t).ok_or_else(mismatch)
            }
        }
    }

    /// Total order used by sorting, rank and search: nulls first, then values.
    ///
    /// Integers compare exactly; mixed numeric kinds compare as f64, and NaN
    /// sorts after every other float.
    #[allow(clippy::cast_precision_loss)]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Utf8(a), Self::Utf8(b)) => a.cmp(b),
            (Self::Datetime(a, ua, _), Self::Datetime(b, ub, _))
            | (Self::Duration(a, ua), Self::Duration(b, ub)) => {
                let a = i128::from(*a) * i128::from(ua.nanos_per_tick());
                let b = i128::from(*b) * i128::from(ub.nanos_per_tick());
                a.cmp(&b)
            }
            (Self::List { values: a, .. }, Self::List { values: b, .. })
            | (Self::Struct { values: a, .. }, Self::Struct { values: b, .. }) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ if self.kind_rank() != other.kind_rank() => self.kind_rank().cmp(&other.kind_rank()),
            _ => match (self.as_num(), other.as_num()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a.cmp(&b),
                (Some(a), Some(b)) => {
                    let to_f = |n: Num| match n {
                        Num::Int(i) => i as f64,
                        Num::Float(f) => f,
                    };
                    canonical_f64(to_f(a)).total_cmp(&canonical_f64(to_f(b)))
                }
                _ => self.kind_rank().cmp(&other.kind_rank()),
            },
        }
    }

    /// Feed a hash consistent with `total_cmp` equality into `state`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn hash_canonical<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::Null => {}
            Self::Utf8(s) => s.hash(state),
            Self::Datetime(t, unit, _) | Self::Duration(t, unit) => {
                (i128::from(*t) * i128::from(unit.nanos_per_tick())).hash(state);
            }
            Self::List { values, .. } | Self::Struct { values, .. } => {
                values.len().hash(state);
                for v in values {
                    v.hash_canonical(state);
                }
            }
            _ => match self.as_num() {
                Some(Num::Int(i)) => i.hash(state),
                Some(Num::Float(f)) => {
                    let f = canonical_f64(f);
                    // Integral floats hash like the equal integer.
                    if f.fract() == 0.0 && f.abs() < 1e30 {
                        (f as i128).hash(state);
                    } else {
                        f.to_bits().hash(state);
                    }
                }
                None => {}
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Int8(_)
            | Self::Int16(_)
            | Self::Int32(_)
            | Self::Int64(_)
            | Self::UInt8(_)
            | Self::UInt16(_)
            | Self::UInt32(_)
            | Self::UInt64(_)
            | Self::Float32(_)
            | Self::Float64(_) => 2,
            Self::Utf8(_) => 3,
            Self::Datetime(..) => 4,
            Self::Duration(..) => 5,
            Self::List { .. } => 6,
            Self::Struct { .. } => 7,
        }
    }
}

/// Collapse `-0.0` onto `0.0` and every NaN payload onto one NaN.
pub(crate) fn canonical_f64(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn num_to_value(num: Num, target: &DataType) -> Option<Value> {
    let int = match num {
        Num::Int(i) => Some(i),
        Num::Float(f) if f.is_finite() => Some(f.trunc() as i128),
        Num::Float(_) => None,
    };
    Some(match target {
        DataType::Boolean => Value::Boolean(match num {
            Num::Int(i) => i != 0,
            Num::Float(f) => f != 0.0,
        }),
        DataType::Int8 => Value::Int8(i8::try_from(int?).ok()?),
        DataType::Int16 => Value::Int16(i16::try_from(int?).ok()?),
        DataType::Int32 => Value::Int32(i32::try_from(int?).ok()?),
        DataType::Int64 => Value::Int64(i64::try_from(int?).ok()?),
        DataType::UInt8 => Value::UInt8(u8::try_from(int?).ok()?),
        DataType::UInt16 => Value::UInt16(u16::try_from(int?).ok()?),
        DataType::UInt32 => Value::UInt32(u32::try_from(int?).ok()?),
        DataType::UInt64 => Value::UInt64(u64::try_from(int?).ok()?),
        DataType::Float32 => Value::Float32(match num {
            Num::Int(i) => i as f32,
            Num::Float(f) => f as f32,
        }),
        DataType::Float64 => Value::Float64(match num {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }),
        _ => return None,
    })
}

fn parse_str(s: &str, target: &DataType) -> Option<Value> {
    let trimmed = s.trim();
    match target {
        DataType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        t if t.is_integer() => num_to_value(Num::Int(trimmed.parse::<i128>().ok()?), t),
        t if t.is_float() => num_to_value(Num::Float(trimmed.parse::<f64>().ok()?), t),
        DataType::Datetime(unit, tz) => {
            let parsed = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })?;
            Some(Value::Datetime(naive_to_ticks(&parsed, *unit)?, *unit, tz.clone()))
        }
        _ => None,
    }
}

fn naive_to_ticks(dt: &NaiveDateTime, unit: TimeUnit) -> Option<i64> {
    let utc = dt.and_utc();
    match unit {
        TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
        TimeUnit::Microseconds => Some(utc.timestamp_micros()),
        TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
    }
}

fn ticks_to_naive(ticks: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ticks)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ticks)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(ticks),
    };
    Some(utc.naive_utc())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Datetime(ticks, unit, tz) => {
                match ticks_to_naive(*ticks, *unit) {
                    Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f"))?,
                    None => write!(f, "{ticks}{unit}")?,
                }
                match tz {
                    Some(tz) => write!(f, " {tz}"),
                    None => Ok(()),
                }
            }
            Self::Duration(ticks, unit) => write!(f, "{ticks}{unit}"),
            Self::List { values, .. } => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Struct { fields, values } => {
                write!(f, "{{")?;
                for (i, (field, v)) in fields.iter().zip(values).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {v}", field.name)?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! impl_from_native {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_native!(
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Utf8,
);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Datetime(dt.and_utc().timestamp_micros(), TimeUnit::Microseconds, None)
    }
}

impl From<chrono::Duration> for Value {
    fn from(d: chrono::Duration) -> Self {
        match d.num_microseconds() {
            Some(us) => Self::Duration(us, TimeUnit::Microseconds),
            None => Self::Duration(d.num_milliseconds(), TimeUnit::Milliseconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kathmandu() -> Option<String> {
        Some("Asia/Kathmandu".to_string())
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42i64).as_i64(), Some(42));
        assert_eq!(Value::from(7u8).as_f64(), Some(7.0));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(Value::Int64(300).cast(&DataType::Int16).unwrap(), Value::Int16(300));
        assert!(Value::Int64(300).cast(&DataType::UInt8).unwrap_err().is_dtype_mismatch());
        assert_eq!(Value::Float64(2.9).cast(&DataType::Int32).unwrap(), Value::Int32(2));
        assert_eq!(Value::Boolean(true).cast(&DataType::UInt8).unwrap(), Value::UInt8(1));
        assert_eq!(Value::from("12").cast(&DataType::Int64).unwrap(), Value::Int64(12));
        assert_eq!(Value::Int32(5).cast(&DataType::Utf8).unwrap(), Value::from("5"));
        assert_eq!(Value::Null.cast(&DataType::Float32).unwrap(), Value::Null);
    }

    #[test]
    fn test_datetime_unit_cast_floors() {
        let v = Value::Datetime(1_500, TimeUnit::Microseconds, None);
        assert_eq!(
            v.cast(&DataType::Datetime(TimeUnit::Milliseconds, None)).unwrap(),
            Value::Datetime(1, TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn test_naive_instant_takes_zone() {
        let v = Value::Datetime(0, TimeUnit::Microseconds, None);
        let cast = v
            .cast(&DataType::Datetime(TimeUnit::Microseconds, kathmandu()))
            .unwrap();
        assert_eq!(cast.dtype(), DataType::Datetime(TimeUnit::Microseconds, kathmandu()));
    }

    #[test]
    fn test_zoned_instant_to_other_zone_fails() {
        let v = Value::Datetime(0, TimeUnit::Microseconds, kathmandu());
        let err = v
            .cast(&DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into())))
            .unwrap_err();
        assert!(err.is_dtype_mismatch());

        let same = v
            .cast(&DataType::Datetime(TimeUnit::Nanoseconds, kathmandu()))
            .unwrap();
        assert_eq!(same, Value::Datetime(0, TimeUnit::Nanoseconds, kathmandu()));
    }

    #[test]
    fn test_parse_datetime_string() {
        let v = Value::from("1970-01-01 00:00:01")
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        assert_eq!(v, Value::Datetime(1_000, TimeUnit::Milliseconds, None));
        assert_eq!(v.to_string(), "1970-01-01 00:00:01");
    }

    #[test]
    fn test_total_cmp() {
        let mut values = vec![
            Value::Float64(f64::NAN),
            Value::Int64(3),
            Value::Null,
            Value::Float64(-1.5),
            Value::UInt8(3),
        ];
        values.sort_by(Value::total_cmp);
        assert!(values[0].is_null());
        assert_eq!(values[1], Value::Float64(-1.5));
        assert_eq!(values[2].total_cmp(&values[3]), Ordering::Equal);
        assert!(matches!(values[4], Value::Float64(f) if f.is_nan()));
    }

    #[test]
    fn test_list_cast_and_display() {
        let v = Value::list(DataType::Int32, vec![Value::Int32(1), Value::Null]);
        let cast = v.cast(&DataType::List(Box::new(DataType::Float64))).unwrap();
        assert_eq!(cast.to_string(), "[1, null]");
        assert_eq!(cast.dtype(), DataType::List(Box::new(DataType::Float64)));
    }
}
