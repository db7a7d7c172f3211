//! Runtime value types carried in compiled plans and result rows.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A runtime scalar value.
///
/// This enum covers every scalar a domain field can hold at query time. It is
/// the payload type of result rows and of clause evaluation inside engines.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum Value {
    /// Absent or unset.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// IEEE 754 single precision.
    Float32(f32),
    /// IEEE 754 double precision.
    Float64(f64),
    /// Owned UTF-8 text.
    String(String),
    /// Raw byte payload.
    Bytes(Vec<u8>),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    /// 16-byte UUID.
    Uuid([u8; 16]),
}

impl Value {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload widened to i64. Covers both integer widths.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload widened to f64. Covers both float widths.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(f) => Some(f64::from(*f)),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the text payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the byte payload, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The timestamp payload in microseconds, if any.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Borrow the UUID payload, if any.
    pub fn as_uuid(&self) -> Option<&[u8; 16]> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec<u8> => Bytes,
    [u8; 16] => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_detection() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int32(0).is_null());
        assert!(!Value::String(String::new()).is_null());
    }

    #[test]
    fn test_widening_accessors() {
        assert_eq!(Value::Int32(-7).as_i64(), Some(-7));
        assert_eq!(Value::Int64(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Float64(2.25).as_f64(), Some(2.25));
        // No cross-family widening.
        assert_eq!(Value::Int64(3).as_f64(), None);
        assert_eq!(Value::Float64(3.0).as_i64(), None);
    }

    #[test]
    fn test_payload_accessors() {
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::String("ok".into()).as_str(), Some("ok"));
        assert_eq!(Value::Bytes(vec![9, 8]).as_bytes(), Some(&[9u8, 8][..]));
        assert_eq!(Value::Timestamp(86_400_000_000).as_timestamp(), Some(86_400_000_000));
        assert_eq!(Value::Uuid([7; 16]).as_uuid(), Some(&[7u8; 16]));
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(12i32), Value::Int32(12));
        assert_eq!(Value::from(12i64), Value::Int64(12));
        assert_eq!(Value::from("abc"), Value::String("abc".into()));
        assert_eq!(Value::from(Some(2.5f64)), Value::Float64(2.5));
        assert_eq!(Value::from(None::<&str>), Value::Null);
    }

    #[test]
    fn test_archived_value_roundtrip() {
        let value = Value::String("département".into());
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&value).unwrap();
        let archived = rkyv::access::<ArchivedValue, rkyv::rancor::Error>(&bytes).unwrap();
        let restored: Value = rkyv::deserialize::<Value, rkyv::rancor::Error>(archived).unwrap();
        assert_eq!(restored, value);

        let uuid = Value::Uuid(*b"0123456789abcdef");
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&uuid).unwrap();
        let restored: Value = rkyv::from_bytes::<Value, rkyv::rancor::Error>(&bytes).unwrap();
        assert_eq!(restored, uuid);
    }
}
