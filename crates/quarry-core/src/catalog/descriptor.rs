//! Declarative model descriptors.
//!
//! A [`DomainModel`] is the raw, author-facing description of entities,
//! fields, and relations. It is deliberately dumb: builders collect exactly
//! what the author wrote, and all validation happens once when the model is
//! handed to [`ModelCatalog::build`](crate::catalog::ModelCatalog::build).

use serde::{Deserialize, Serialize};

use crate::catalog::types::{ComputedKind, ScalarType};
use crate::error::Error;

/// A single scalar field on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub scalar: ScalarType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub computed: Option<ComputedKind>,
    #[serde(default)]
    pub shadow: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            nullable: false,
            computed: None,
            shadow: false,
        }
    }

    /// Mark the field as accepting null.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field as computed.
    pub fn computed(mut self, kind: ComputedKind) -> Self {
        self.computed = Some(kind);
        self
    }

    /// Mark the field as shadow state: persisted for bookkeeping but never
    /// exposed through queries.
    pub fn shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    /// True when the field occupies its own storage and is visible to
    /// queries. Shadow fields and virtual computed fields are not.
    pub fn has_storage(&self) -> bool {
        !self.shadow && self.computed != Some(ComputedKind::Virtual)
    }
}

/// Relation multiplicity as written in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    ToOne,
    ToMany,
    /// Join-table relation. The catalog treats it as to-many from either
    /// side.
    ManyToMany,
}

/// A named link from one entity to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub name: String,
    pub target: String,
    pub kind: RelationKind,
    #[serde(default)]
    pub inverse: Option<String>,
}

impl RelationDescriptor {
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: RelationKind::ToOne,
            inverse: None,
        }
    }

    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: RelationKind::ToMany,
            inverse: None,
        }
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: RelationKind::ManyToMany,
            inverse: None,
        }
    }

    /// Name of the relation on the target entity pointing back at this one.
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }
}

/// One entity: its identity field, scalars, and relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub identity_field: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub relations: Vec<RelationDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_relations(mut self, relations: Vec<RelationDescriptor>) -> Self {
        self.relations.extend(relations);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// The full model as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainModel {
    pub entities: Vec<EntityDescriptor>,
}

impl DomainModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn get_entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Deserialize a model from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidModel(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldDescriptor::new("deletedAt", ScalarType::Timestamp).nullable();
        assert_eq!(field.name, "deletedAt");
        assert!(field.nullable);
        assert!(field.has_storage());
    }

    #[test]
    fn test_storage_visibility() {
        let stored = FieldDescriptor::new("total", ScalarType::Int64)
            .computed(ComputedKind::Materialized);
        let virtual_field = FieldDescriptor::new("displayName", ScalarType::String)
            .computed(ComputedKind::Virtual);
        let shadow = FieldDescriptor::new("departmentId", ScalarType::Uuid).shadow();

        assert!(stored.has_storage());
        assert!(!virtual_field.has_storage());
        assert!(!shadow.has_storage());
    }

    #[test]
    fn test_entity_builder() {
        let entity = EntityDescriptor::new("Employee", "id")
            .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
            .with_field(FieldDescriptor::new("firstName", ScalarType::String))
            .with_relation(RelationDescriptor::to_one("department", "Department"));

        assert_eq!(entity.fields.len(), 2);
        assert!(entity.get_field("firstName").is_some());
        assert!(entity.get_relation("department").is_some());
        assert!(entity.get_relation("firstName").is_none());
    }

    #[test]
    fn test_model_from_json() {
        let json = r#"{
            "entities": [
                {
                    "name": "Tag",
                    "identity_field": "id",
                    "fields": [{"name": "id", "scalar": "Uuid"}],
                    "relations": []
                }
            ]
        }"#;
        let model = DomainModel::from_json(json).unwrap();
        assert_eq!(model.entities.len(), 1);
        assert_eq!(model.entities[0].name, "Tag");
    }

    #[test]
    fn test_model_from_bad_json() {
        let err = DomainModel::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }
}
