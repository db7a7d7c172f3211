//! Materialized query results.
//!
//! Flat results are column-ordered value rows and carry the full
//! rkyv + serde derive set. Graph results are recursive by nature, which rules
//! out the rkyv derive; they are serde-only and intended for handoff to an
//! external serializer such as `serde_json`.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::value::Value;

/// A named scalar value on a graph row.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct RowField {
    pub name: String,
    pub value: Value,
}

/// A to-one link on a graph row; `None` when the link is absent.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct RowLink {
    pub name: String,
    pub row: Option<Box<GraphRow>>,
}

/// A to-many collection on a graph row.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct RowCollection {
    pub name: String,
    pub rows: Vec<GraphRow>,
}

/// One entity instance in a graph-preserving result, with its projected
/// scalar fields and nested relation levels.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct GraphRow {
    /// Entity this row was projected from.
    pub entity: String,
    /// Projected scalar fields, in projection order.
    pub values: Vec<RowField>,
    /// Projected to-one links, null-guarded.
    pub to_one: Vec<RowLink>,
    /// Projected to-many collections.
    pub to_many: Vec<RowCollection>,
}

impl GraphRow {
    /// Create an empty row for an entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: Vec::new(),
            to_one: Vec::new(),
            to_many: Vec::new(),
        }
    }

    /// Look up a projected scalar by field name.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Look up a projected to-one link by relation name.
    pub fn link(&self, name: &str) -> Option<&RowLink> {
        self.to_one.iter().find(|l| l.name == name)
    }

    /// Look up a projected collection by relation name.
    pub fn collection(&self, name: &str) -> Option<&RowCollection> {
        self.to_many.iter().find(|c| c.name == name)
    }
}

/// A flattening result: named columns over uniform value rows.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FlatResultSet {
    /// Output column names, in projection order.
    pub columns: Vec<String>,
    /// Rows; every row has exactly `columns.len()` values.
    pub rows: Vec<Vec<Value>>,
}

impl FlatResultSet {
    /// Create an empty result with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The caller is responsible for matching the column count.
    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `(row, column-name)`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// The materialized output of a compiled query, in either shape.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub enum ResultSet {
    /// Graph-preserving output: one nested row per root entity.
    Graph(Vec<GraphRow>),
    /// Flattening output: deduplicated flat rows.
    Flat(FlatResultSet),
}

impl ResultSet {
    /// Number of top-level rows.
    pub fn row_count(&self) -> usize {
        match self {
            ResultSet::Graph(rows) => rows.len(),
            ResultSet::Flat(flat) => flat.rows.len(),
        }
    }

    /// The graph rows, if this is a graph-preserving result.
    pub fn as_graph(&self) -> Option<&[GraphRow]> {
        match self {
            ResultSet::Graph(rows) => Some(rows),
            ResultSet::Flat(_) => None,
        }
    }

    /// The flat result, if this is a flattening result.
    pub fn as_flat(&self) -> Option<&FlatResultSet> {
        match self {
            ResultSet::Flat(flat) => Some(flat),
            ResultSet::Graph(_) => None,
        }
    }
}
