//! Compiled query IR handed to a relational engine.
//!
//! Both compiled forms carry their clause operations as an ordered list; the
//! order is load-bearing (filter, then sort, then limit, with projection
//! applied last by the engine) and engines must apply it as given.
//!
//! Note: To avoid recursive type issues with rkyv, the graph projection is
//! represented as a flat list of path-keyed groups rather than a nested tree;
//! engines reconstruct the nesting from path prefixes.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Cardinality of a relation as seen from its declaring entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub enum Cardinality {
    /// The relation holds at most one target entity.
    ToOne,
    /// The relation holds a collection of target entities.
    ToMany,
}

impl Cardinality {
    /// Check if this is a collection-valued relation.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::ToMany)
    }
}

/// A single clause operation to apply to the unprojected entity source.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum EngineOp {
    /// Filter by a predicate text.
    Filter(String),
    /// Sort by a sort-key list text.
    Sort(String),
    /// Keep at most this many root rows.
    Limit(u32),
}

/// A relation path to eager-load, e.g. "department" or "orders.lines".
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct IncludePath {
    /// Dot-separated relation path from the root entity.
    pub path: String,
    /// Target entity at the end of the path.
    pub entity: String,
    /// Cardinality of the final relation segment.
    pub cardinality: Cardinality,
}

impl IncludePath {
    /// Create a new include path.
    pub fn new(
        path: impl Into<String>,
        entity: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            path: path.into(),
            entity: entity.into(),
            cardinality,
        }
    }

    /// Depth of this include (1 for top-level, 2 for nested, etc.).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }

    /// Parent path, if this is a nested include.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Final relation segment of the path.
    pub fn name(&self) -> &str {
        self.path.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.path)
    }
}

/// The selected scalar fields of one relation level in a graph projection.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct ProjectionGroup {
    /// Dot-separated relation path from the root entity.
    pub path: String,
    /// Entity projected at this level.
    pub entity: String,
    /// Cardinality of the relation segment ending the path. A `ToOne` group
    /// binds as a single nested object and must be null-guarded; a `ToMany`
    /// group binds as an element-wise projected collection.
    pub cardinality: Cardinality,
    /// Scalar fields selected at this level.
    pub fields: Vec<String>,
}

impl ProjectionGroup {
    /// Create a new projection group.
    pub fn new(
        path: impl Into<String>,
        entity: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            path: path.into(),
            entity: entity.into(),
            cardinality,
            fields: Vec::new(),
        }
    }

    /// Add a selected scalar field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Parent path; empty string for a top-level group.
    pub fn parent_path(&self) -> &str {
        self.path.rsplit_once('.').map(|(parent, _)| parent).unwrap_or("")
    }

    /// Final relation segment of the path.
    pub fn name(&self) -> &str {
        self.path.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.path)
    }
}

/// Selective projection for a graph-preserving query.
///
/// The root level carries its fields directly; every included relation level
/// is a [`ProjectionGroup`] keyed by its path.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct GraphProjection {
    /// Root entity name.
    pub entity: String,
    /// Scalar fields selected on the root.
    pub fields: Vec<String>,
    /// One group per included relation path, ordered outer-to-inner.
    pub groups: Vec<ProjectionGroup>,
}

impl GraphProjection {
    /// Create a projection with no fields selected yet.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Add a root scalar field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Add a relation-level group.
    pub fn with_group(mut self, group: ProjectionGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Look up the group at an exact relation path.
    pub fn group_at(&self, path: &str) -> Option<&ProjectionGroup> {
        self.groups.iter().find(|g| g.path == path)
    }

    /// Groups whose parent is the given path ("" for top-level groups).
    pub fn children_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ProjectionGroup> {
        self.groups.iter().filter(move |g| g.parent_path() == path)
    }

    /// Total number of selected scalar fields across all levels.
    pub fn scalar_count(&self) -> usize {
        self.fields.len() + self.groups.iter().map(|g| g.fields.len()).sum::<usize>()
    }
}

/// A graph-preserving compiled query: eager-load set plus nested projection.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct CompiledGraphQuery {
    /// Root entity the query runs against.
    pub source: String,
    /// Clause operations in application order.
    pub ops: Vec<EngineOp>,
    /// Relation paths to eager-load, collapsed to maximal paths (an include
    /// of "a.b" implies "a").
    pub includes: Vec<IncludePath>,
    /// The selective projection.
    pub projection: GraphProjection,
    /// Deduplicate result rows after projection. Set only when no to-many
    /// relation occurs anywhere in the selection; nested collections make
    /// row-level deduplication invalid.
    pub distinct: bool,
}

/// One flat-join step of a flattening query.
///
/// Steps are ordered outer-to-inner. Each step pairs every row built so far
/// with every element of a collection reached from that row: `outer_hops`
/// walks from the top of the pairing structure back to the join anchor, `via`
/// crosses any to-one relations between the anchor entity and the collection,
/// and `relation` is the to-many relation being joined.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlatJoinStep {
    /// Dot-separated path of the collection boundary.
    pub path: String,
    /// The to-many relation name joined by this step.
    pub relation: String,
    /// Entity owning `relation` (the entity reached after `via`).
    pub source_entity: String,
    /// Element entity of the joined collection.
    pub target_entity: String,
    /// 0-based join order, shallowest boundary first.
    pub level: u32,
    /// Number of earlier boundaries that are proper path prefixes of this one.
    pub common_ancestor_depth: u32,
    /// Outer hops from the current row top to the join anchor element.
    pub outer_hops: u32,
    /// To-one relation segments between the anchor entity and `relation`.
    pub via: Vec<String>,
}

/// Position of one projected field in the final flat row shape.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlatAccessor {
    /// Outer hops from the top of the pairing structure to the anchor
    /// element (the owning boundary's element, or the root leaf).
    pub outer_hops: u32,
    /// Path of the boundary owning this field; `None` when the field is
    /// reached from the root.
    pub boundary: Option<String>,
    /// Remaining path segments below the anchor: zero or more to-one hops
    /// followed by the scalar field name. Missing to-one links propagate
    /// null.
    pub segments: Vec<String>,
}

/// An `(accessor, alias)` pair of the flat projection.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlatField {
    /// Where the value lives in the flat row shape.
    pub accessor: FlatAccessor,
    /// Output column name: the field path with dots replaced by underscores.
    pub alias: String,
}

/// Projection list of a flattening query.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlatProjection {
    /// Projected fields in output column order.
    pub fields: Vec<FlatField>,
}

impl FlatProjection {
    /// Output column names in order.
    pub fn aliases(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.alias.as_str()).collect()
    }
}

/// A flattening compiled query: ordered join steps plus a flat projection.
///
/// Flat output is always deduplicated by the engine; the final shape is flat
/// by construction, so row-level deduplication is always valid here.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct CompiledFlatQuery {
    /// Root entity the query runs against.
    pub source: String,
    /// Clause operations in application order.
    pub ops: Vec<EngineOp>,
    /// Flat-join steps, outer-to-inner.
    pub joins: Vec<FlatJoinStep>,
    /// The flat projection.
    pub projection: FlatProjection,
}

/// A compiled query in either shape.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum CompiledQuery {
    /// Graph-preserving form: nested collections stay nested.
    Graph(CompiledGraphQuery),
    /// Flattening form: one flat row per leaf combination.
    Flat(CompiledFlatQuery),
}

impl CompiledQuery {
    /// Root entity the query runs against.
    pub fn source(&self) -> &str {
        match self {
            CompiledQuery::Graph(q) => &q.source,
            CompiledQuery::Flat(q) => &q.source,
        }
    }

    /// Clause operations in application order.
    pub fn ops(&self) -> &[EngineOp] {
        match self {
            CompiledQuery::Graph(q) => &q.ops,
            CompiledQuery::Flat(q) => &q.ops,
        }
    }

    /// Append a clause operation.
    pub fn push_op(&mut self, op: EngineOp) {
        match self {
            CompiledQuery::Graph(q) => q.ops.push(op),
            CompiledQuery::Flat(q) => q.ops.push(op),
        }
    }

    /// Short human-readable name of the compilation strategy.
    pub fn shape_name(&self) -> &'static str {
        match self {
            CompiledQuery::Graph(_) => "graph-preserving",
            CompiledQuery::Flat(_) => "flattening",
        }
    }
}
