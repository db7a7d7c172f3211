//! Resolved per-entity metadata.

use std::collections::HashMap;

use quarry_plan::Cardinality;

use crate::catalog::types::ScalarType;
use crate::error::Error;

/// A queryable scalar field after catalog resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub name: String,
    pub value_type: ScalarType,
    pub nullable: bool,
    /// True for the entity's identity field.
    pub is_key: bool,
}

/// A relation after catalog resolution. `target_entity` holds the canonical
/// entity name, and many-to-many relations have already been normalized to
/// [`Cardinality::ToMany`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMetadata {
    pub name: String,
    pub target_entity: String,
    pub cardinality: Cardinality,
    pub inverse_field: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Scalar(usize),
    Relation(usize),
}

/// Outcome of a name lookup on an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Scalar(&'a FieldMetadata),
    Relation(&'a RelationMetadata),
}

/// One entity's resolved metadata with case-insensitive name lookup.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub name: String,
    scalar_fields: Vec<FieldMetadata>,
    relation_fields: Vec<RelationMetadata>,
    lookup: HashMap<String, FieldKind>,
}

impl EntityMetadata {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scalar_fields: Vec::new(),
            relation_fields: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub(crate) fn add_scalar(&mut self, field: FieldMetadata) -> Result<(), Error> {
        let key = field.name.to_lowercase();
        if self.lookup.contains_key(&key) {
            return Err(Error::InvalidModel(format!(
                "duplicate field '{}' on entity {}",
                field.name, self.name
            )));
        }
        self.lookup
            .insert(key, FieldKind::Scalar(self.scalar_fields.len()));
        self.scalar_fields.push(field);
        Ok(())
    }

    pub(crate) fn add_relation(&mut self, relation: RelationMetadata) -> Result<(), Error> {
        let key = relation.name.to_lowercase();
        if self.lookup.contains_key(&key) {
            return Err(Error::InvalidModel(format!(
                "duplicate field '{}' on entity {}",
                relation.name, self.name
            )));
        }
        self.lookup
            .insert(key, FieldKind::Relation(self.relation_fields.len()));
        self.relation_fields.push(relation);
        Ok(())
    }

    /// Resolve a field or relation name, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<FieldRef<'_>> {
        match self.lookup.get(&name.to_lowercase())? {
            FieldKind::Scalar(i) => Some(FieldRef::Scalar(&self.scalar_fields[*i])),
            FieldKind::Relation(i) => Some(FieldRef::Relation(&self.relation_fields[*i])),
        }
    }

    /// Resolve a name to a scalar field, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        match self.resolve(name) {
            Some(FieldRef::Scalar(f)) => Some(f),
            _ => None,
        }
    }

    /// Resolve a name to a relation, ignoring case.
    pub fn relation(&self, name: &str) -> Option<&RelationMetadata> {
        match self.resolve(name) {
            Some(FieldRef::Relation(r)) => Some(r),
            _ => None,
        }
    }

    /// All queryable scalar fields, in declaration order.
    pub fn scalar_fields(&self) -> &[FieldMetadata] {
        &self.scalar_fields
    }

    /// All relations, in declaration order.
    pub fn relations(&self) -> &[RelationMetadata] {
        &self.relation_fields
    }
}
