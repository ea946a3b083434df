//! SQL values and parameter handling.
//!
//! Every value that crosses the executor boundary is a [`SqlValue`]. Entity
//! fields convert to and from it through [`FieldType`]; ad-hoc arguments
//! (predicate parameters, update assignments) go through [`ToSqlValue`].

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::DecodeError;

/// A SQL value that can be used as a bound parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns whether this is the zero value of its storage class.
    ///
    /// This is the fallback of [`FieldType::is_zero`]; types whose zero
    /// does not encode to an empty value override it.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !*b,
            Self::Int(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
        }
    }

    /// Returns the storage class name, used in decode errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    /// Returns the parameter placeholder.
    #[must_use]
    pub const fn placeholder() -> &'static str {
        "?"
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident via $conv:expr),+ $(,)?) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::$variant($conv(self))
                }
            }

            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    value.to_sql_value()
                }
            }
        )+
    };
}

impl_scalar! {
    bool => Bool via std::convert::identity,
    i64 => Int via std::convert::identity,
    i32 => Int via i64::from,
    i16 => Int via i64::from,
    i8 => Int via i64::from,
    u32 => Int via i64::from,
    u16 => Int via i64::from,
    u8 => Int via i64::from,
    f64 => Float via std::convert::identity,
    f32 => Float via f64::from,
    String => Text via std::convert::identity,
    Vec<u8> => Blob via std::convert::identity,
    NaiveDateTime => Text via format_naive,
    DateTime<Utc> => Text via format_utc,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        value.to_sql_value()
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S%.f";

fn format_naive(dt: NaiveDateTime) -> String {
    dt.format(SQLITE_DATETIME).to_string()
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Dialect-independent type class of an entity field.
///
/// A [`crate::Dialect`] turns this into the column type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`.
    Bool,
    /// Integers up to 32 bits.
    Integer,
    /// 64-bit integers.
    BigInt,
    /// Floating point numbers.
    Real,
    /// Strings.
    Text,
    /// Byte vectors.
    Blob,
    /// Date-time values.
    DateTime,
}

/// A Rust type that can be stored in an entity field.
///
/// Implemented for the scalar types, `String`, `Vec<u8>`, chrono date-times
/// and `Option` of any of them.
pub trait FieldType: Sized {
    /// The type class used to pick the column type.
    const KIND: ValueKind;

    /// Converts the field value to a bound parameter.
    fn to_value(&self) -> SqlValue;

    /// Decodes a column value read back from the database.
    fn from_value(value: SqlValue) -> Result<Self, DecodeError>;

    /// Returns whether the field holds its type's zero value.
    ///
    /// Zero fields are left out of `save` assignments and of sample-entity
    /// predicates.
    fn is_zero(&self) -> bool {
        self.to_value().is_zero()
    }
}

fn mismatch<T>(expected: &'static str, value: &SqlValue) -> Result<T, DecodeError> {
    Err(DecodeError::TypeMismatch {
        field: String::new(),
        expected,
        found: value.type_name(),
    })
}

impl FieldType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(n) => Ok(n != 0),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! impl_int_field {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn to_value(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }

                fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
                    match value {
                        SqlValue::Int(n) => <$ty>::try_from(n).map_err(|_| {
                            DecodeError::OutOfRange {
                                field: String::new(),
                                value: n,
                                target: stringify!($ty),
                            }
                        }),
                        SqlValue::Bool(b) => Ok(<$ty>::from(b)),
                        other => mismatch(stringify!($ty), &other),
                    }
                }
            }
        )+
    };
}

impl_int_field! {
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    u8 => Integer,
    u16 => Integer,
    u32 => BigInt,
    i64 => BigInt,
}

impl FieldType for f64 {
    const KIND: ValueKind = ValueKind::Real;

    fn to_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as Self),
            other => mismatch("f64", &other),
        }
    }
}

impl FieldType for f32 {
    const KIND: ValueKind = ValueKind::Real;

    fn to_value(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Float(f) => Ok(f as Self),
            SqlValue::Int(n) => Ok(n as Self),
            other => mismatch("f32", &other),
        }
    }
}

impl FieldType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl FieldType for Vec<u8> {
    const KIND: ValueKind = ValueKind::Blob;

    fn to_value(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => mismatch("blob", &other),
        }
    }
}

impl FieldType for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(format_naive(*self))
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Text(s) => Self::parse_from_str(&s, SQLITE_DATETIME)
                .or_else(|_| DateTime::parse_from_rfc3339(&s).map(|dt| dt.naive_utc()))
                .map_err(|_| DecodeError::InvalidDateTime {
                    field: String::new(),
                    text: s,
                }),
            other => mismatch("datetime", &other),
        }
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::DateTime;

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(self.to_rfc3339())
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(&s, SQLITE_DATETIME).map(|dt| dt.and_utc())
                })
                .map_err(|_| DecodeError::InvalidDateTime {
                    field: String::new(),
                    text: s,
                }),
            other => mismatch("datetime", &other),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, FieldType::to_value)
    }

    fn from_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(SqlValue::Null.is_zero());
        assert!(SqlValue::Int(0).is_zero());
        assert!(SqlValue::Float(0.0).is_zero());
        assert!(SqlValue::Text(String::new()).is_zero());
        assert!(SqlValue::Bool(false).is_zero());
        assert!(SqlValue::Blob(vec![]).is_zero());

        assert!(!SqlValue::Int(18).is_zero());
        assert!(!SqlValue::Text(String::from("Tom")).is_zero());
        assert!(!SqlValue::Bool(true).is_zero());
    }

    #[test]
    fn test_field_zero_follows_the_field_type() {
        assert!(0_i32.is_zero());
        assert!(String::new().is_zero());
        assert!(!FieldType::is_zero(&String::from("Tom")));
        assert!(NaiveDateTime::default().is_zero());
        assert!(DateTime::<Utc>::default().is_zero());

        let at = NaiveDateTime::parse_from_str("2024-03-01 10:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert!(!at.is_zero());
    }

    #[test]
    fn test_option_zero_is_none() {
        assert!(None::<i32>.is_zero());
        assert!(!Some(0_i32).is_zero());
        assert!(!Some(false).is_zero());
        assert!(!Some(String::new()).is_zero());
        assert!(!Some(NaiveDateTime::default()).is_zero());
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(SqlValue::from("Tom"), SqlValue::Text(String::from("Tom")));
        assert_eq!(SqlValue::from(Some(7_u8)), SqlValue::Int(7));
    }

    #[test]
    fn test_field_decode_accepts_sqlite_storage_classes() {
        assert!(bool::from_value(SqlValue::Int(1)).unwrap());
        assert!((f64::from_value(SqlValue::Int(3)).unwrap() - 3.0).abs() < f64::EPSILON);
        assert_eq!(Option::<i32>::from_value(SqlValue::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(SqlValue::Int(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_field_decode_rejects_wrong_type() {
        let err = i64::from_value(SqlValue::Text(String::from("x"))).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch { expected: "i64", found: "text", .. }
        ));
    }

    #[test]
    fn test_field_decode_out_of_range() {
        let err = u8::from_value(SqlValue::Int(300)).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfRange { value: 300, .. }));
    }

    #[test]
    fn test_datetime_round_trip_through_text() {
        let dt = NaiveDateTime::parse_from_str("2024-03-01 10:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let value = dt.to_value();
        assert_eq!(value, SqlValue::Text(String::from("2024-03-01 10:30:00")));
        assert_eq!(NaiveDateTime::from_value(value).unwrap(), dt);
    }
}
