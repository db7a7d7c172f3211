//! Domain model descriptors and the resolved catalog built from them.
//!
//! Authors describe entities with [`DomainModel`] builders (or JSON via
//! [`DomainModel::from_json`]). [`ModelCatalog::build`] resolves that
//! description once: it validates relation targets, skips fields with no
//! queryable storage, normalizes many-to-many links, and indexes every name
//! for case-insensitive lookup. Everything downstream of the catalog works
//! with canonical names only.

mod catalog;
mod descriptor;
mod entity;
mod types;

pub use catalog::ModelCatalog;
pub use descriptor::{
    DomainModel, EntityDescriptor, FieldDescriptor, RelationDescriptor, RelationKind,
};
pub use entity::{EntityMetadata, FieldMetadata, FieldRef, RelationMetadata};
pub use types::{ComputedKind, ScalarType};
