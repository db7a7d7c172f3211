//! Quarry Core - Model catalog, field trees, and shape-driven query compilers.
//!
//! A [`ModelCatalog`] indexes a domain model for case-insensitive lookup,
//! [`FieldTreeParser`] turns field path specs into a selection tree, and the
//! two compilers lower a selection into the IR defined by `quarry-plan`:
//! [`GraphCompiler`] preserves entity structure, [`FlatCompiler`] flattens
//! collection crossings into join steps. [`QueryOrchestrator`] ties the
//! pieces together behind one request type and screens clause texts before
//! anything else runs.

pub mod catalog;
pub mod compile;
pub mod engine;
pub mod error;
pub mod fieldtree;
pub mod orchestrate;

pub use catalog::{
    ComputedKind, DomainModel, EntityDescriptor, EntityMetadata, FieldDescriptor, FieldMetadata,
    FieldRef, ModelCatalog, RelationDescriptor, RelationKind, RelationMetadata, ScalarType,
};
pub use compile::{FlatCompiler, GraphCompiler};
pub use error::Error;
pub use fieldtree::{FieldNode, FieldSelection, FieldTreeParser, DEFAULT_MAX_DEPTH};
pub use orchestrate::{ClausePolicy, QueryOrchestrator, QueryRequest, QueryRun, QueryShape};

// Engine exports
pub use engine::{InstanceId, MemoryEngine};

/// Re-export compiled-plan types.
pub use quarry_plan as plan;
