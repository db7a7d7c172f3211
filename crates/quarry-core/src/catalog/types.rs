use serde::{Deserialize, Serialize};

/// Scalar storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
    Timestamp,
    Uuid,
}

impl ScalarType {
    /// True for integer and floating point types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float32 | ScalarType::Float64
        )
    }

    /// True for types compared and matched as text.
    pub fn is_string_like(&self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Uuid)
    }
}

/// How a computed field obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputedKind {
    /// Evaluated on write and stored alongside regular fields. Selectable
    /// like any stored scalar.
    Materialized,
    /// Evaluated on read with no independent storage. The catalog skips
    /// these: they cannot be projected or filtered.
    Virtual,
}
