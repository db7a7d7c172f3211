//! Quarry compiled-plan types and the engine contract.
//!
//! This crate defines the IR a shape compiler produces and the interface a
//! relational engine consumes, using rkyv for zero-copy serialization of the
//! flat plan and result types.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for projected fields
//! - [`query`] - Compiled query IR for both output shapes
//! - [`row`] - The pairing structure flat-join execution builds
//! - [`result`] - Materialized graph and flat results
//! - [`engine`] - The session contract engines implement
//! - [`explain`] - Human-readable plan rendering
//! - [`error`] - Engine-side error types
//!
//! # Serialization
//!
//! The compiled query and flat result types derive `rkyv::Archive`,
//! `rkyv::Serialize`, and `rkyv::Deserialize` alongside serde. Use rkyv
//! directly for the zero-copy path:
//!
//! ```ignore
//! use quarry_plan::CompiledQuery;
//!
//! let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&query).unwrap();
//! let archived =
//!     rkyv::access::<query::ArchivedCompiledQuery, rkyv::rancor::Error>(&bytes).unwrap();
//! let deserialized: CompiledQuery =
//!     rkyv::deserialize::<CompiledQuery, rkyv::rancor::Error>(archived).unwrap();
//! ```
//!
//! Graph results are recursive and therefore serde-only; hand them to an
//! external serializer such as `serde_json`.

pub mod engine;
pub mod error;
pub mod explain;
pub mod query;
pub mod result;
pub mod row;
pub mod value;

pub use error::EngineError;

// Re-export commonly used types at crate root
pub use engine::{EngineSession, ProjectionSpec, RelationalEngine};
pub use explain::plan_text;
pub use query::{
    Cardinality, CompiledFlatQuery, CompiledGraphQuery, CompiledQuery, EngineOp, FlatAccessor,
    FlatField, FlatJoinStep, FlatProjection, GraphProjection, IncludePath, ProjectionGroup,
};
pub use result::{FlatResultSet, GraphRow, ResultSet, RowCollection, RowField, RowLink};
pub use row::JoinRow;
pub use value::Value;

/// Plan format version for wire compatibility.
///
/// Archived plans carry no self-describing header, so peers exchanging them
/// must agree on this version. When the IR changes in incompatible ways,
/// this version should be incremented.
pub const PLAN_FORMAT_VERSION: u32 = 1;
