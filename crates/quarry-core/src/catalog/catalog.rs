//! One-time model resolution.

use std::collections::HashMap;

use quarry_plan::Cardinality;
use tracing::info;

use crate::catalog::descriptor::{DomainModel, RelationKind};
use crate::catalog::entity::{EntityMetadata, FieldMetadata, FieldRef, RelationMetadata};
use crate::error::Error;

/// Resolved metadata for every entity in the model.
///
/// Built once from a [`DomainModel`] and then shared immutably by parsers,
/// compilers, and engines. Lookup is case-insensitive throughout; canonical
/// names (as declared in the model) are preserved in the metadata so that
/// compiled output always carries the declared spelling.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entities: HashMap<String, EntityMetadata>,
}

impl ModelCatalog {
    /// Resolve a declarative model into queryable metadata.
    ///
    /// Validation is strict: duplicate entity names, duplicate field names,
    /// a missing identity field, or a relation pointing at an entity the
    /// model does not declare all fail the build. A model that builds is
    /// safe to compile against without further checks.
    pub fn build(model: DomainModel) -> Result<Self, Error> {
        let mut canonical: HashMap<String, String> = HashMap::new();
        for entity in &model.entities {
            let key = entity.name.to_lowercase();
            if canonical.insert(key, entity.name.clone()).is_some() {
                return Err(Error::InvalidModel(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }
        }

        let mut entities = HashMap::new();
        for descriptor in &model.entities {
            let mut entity = EntityMetadata::new(descriptor.name.clone());

            let mut identity_seen = false;
            for field in &descriptor.fields {
                if !field.has_storage() {
                    continue;
                }
                let is_key = field.name == descriptor.identity_field;
                identity_seen |= is_key;
                entity.add_scalar(FieldMetadata {
                    name: field.name.clone(),
                    value_type: field.scalar,
                    nullable: field.nullable,
                    is_key,
                })?;
            }
            if !identity_seen {
                return Err(Error::InvalidModel(format!(
                    "entity {} has no stored identity field '{}'",
                    descriptor.name, descriptor.identity_field
                )));
            }

            for relation in &descriptor.relations {
                let target = match canonical.get(&relation.target.to_lowercase()) {
                    Some(name) => name.clone(),
                    None => {
                        return Err(Error::InvalidModel(format!(
                            "relation {}.{} targets unknown entity '{}'",
                            descriptor.name, relation.name, relation.target
                        )))
                    }
                };
                let cardinality = match relation.kind {
                    RelationKind::ToOne => Cardinality::ToOne,
                    RelationKind::ToMany | RelationKind::ManyToMany => Cardinality::ToMany,
                };
                entity.add_relation(RelationMetadata {
                    name: relation.name.clone(),
                    target_entity: target,
                    cardinality,
                    inverse_field: relation.inverse.clone(),
                })?;
            }

            entities.insert(descriptor.name.to_lowercase(), entity);
        }

        info!(entities = entities.len(), "model catalog built");
        Ok(Self { entities })
    }

    /// Look up an entity by name, ignoring case.
    pub fn get(&self, name: &str) -> Result<&EntityMetadata, Error> {
        self.entities
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// True when the entity exists, ignoring case.
    pub fn exists(&self, name: &str) -> bool {
        self.entities.contains_key(&name.to_lowercase())
    }

    /// Canonical entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.values().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Walk a dotted path from `entity`, requiring every non-final segment
    /// to be a relation. Returns false on any unresolved segment.
    pub fn is_valid_path(&self, entity: &str, path: &str) -> bool {
        let Ok(mut current) = self.get(entity) else {
            return false;
        };
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            match current.resolve(segment) {
                Some(FieldRef::Scalar(_)) => {
                    if i + 1 != segments.len() {
                        return false;
                    }
                }
                Some(FieldRef::Relation(relation)) => {
                    if i + 1 == segments.len() {
                        return true;
                    }
                    current = match self.get(&relation.target_entity) {
                        Ok(e) => e,
                        Err(_) => return false,
                    };
                }
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::descriptor::{EntityDescriptor, FieldDescriptor, RelationDescriptor};
    use crate::catalog::types::{ComputedKind, ScalarType};

    fn staff_model() -> DomainModel {
        DomainModel::new()
            .with_entity(
                EntityDescriptor::new("Employee", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_field(FieldDescriptor::new("firstName", ScalarType::String))
                    .with_field(FieldDescriptor::new("lastName", ScalarType::String))
                    .with_field(
                        FieldDescriptor::new("displayName", ScalarType::String)
                            .computed(ComputedKind::Virtual),
                    )
                    .with_field(FieldDescriptor::new("departmentId", ScalarType::Uuid).shadow())
                    .with_relation(
                        RelationDescriptor::to_one("department", "Department")
                            .with_inverse("members"),
                    )
                    .with_relation(RelationDescriptor::many_to_many("projects", "Project")),
            )
            .with_entity(
                EntityDescriptor::new("Department", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_field(FieldDescriptor::new("name", ScalarType::String))
                    .with_relation(RelationDescriptor::to_many("members", "Employee")),
            )
            .with_entity(
                EntityDescriptor::new("Project", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_field(FieldDescriptor::new("title", ScalarType::String)),
            )
    }

    #[test]
    fn test_build_and_lookup() {
        let catalog = ModelCatalog::build(staff_model()).unwrap();
        let employee = catalog.get("employee").unwrap();
        assert_eq!(employee.name, "Employee");
        assert!(catalog.exists("DEPARTMENT"));
        assert_eq!(catalog.entity_names(), vec!["Department", "Employee", "Project"]);
        assert!(matches!(
            catalog.get("Order").unwrap_err(),
            Error::UnknownEntity(name) if name == "Order"
        ));
    }

    #[test]
    fn test_virtual_and_shadow_fields_skipped() {
        let catalog = ModelCatalog::build(staff_model()).unwrap();
        let employee = catalog.get("Employee").unwrap();
        assert!(employee.field("displayName").is_none());
        assert!(employee.field("departmentId").is_none());
        assert!(employee.field("firstName").is_some());
    }

    #[test]
    fn test_identity_field_marked() {
        let catalog = ModelCatalog::build(staff_model()).unwrap();
        let employee = catalog.get("Employee").unwrap();
        assert!(employee.field("id").unwrap().is_key);
        assert!(!employee.field("firstName").unwrap().is_key);
    }

    #[test]
    fn test_many_to_many_normalized() {
        let catalog = ModelCatalog::build(staff_model()).unwrap();
        let employee = catalog.get("Employee").unwrap();
        let projects = employee.relation("projects").unwrap();
        assert_eq!(projects.cardinality, Cardinality::ToMany);
        assert_eq!(projects.target_entity, "Project");
    }

    #[test]
    fn test_relation_target_stored_canonically() {
        let model = DomainModel::new()
            .with_entity(
                EntityDescriptor::new("Note", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_relation(RelationDescriptor::to_one("author", "USER")),
            )
            .with_entity(
                EntityDescriptor::new("User", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid)),
            );
        let catalog = ModelCatalog::build(model).unwrap();
        let author = catalog.get("Note").unwrap().relation("author").unwrap();
        assert_eq!(author.target_entity, "User");
    }

    #[test]
    fn test_missing_relation_target_is_fatal() {
        let model = DomainModel::new().with_entity(
            EntityDescriptor::new("Employee", "id")
                .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                .with_relation(RelationDescriptor::to_one("department", "Department")),
        );
        let err = ModelCatalog::build(model).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(msg) if msg.contains("Department")));
    }

    #[test]
    fn test_missing_identity_is_fatal() {
        let model = DomainModel::new().with_entity(
            EntityDescriptor::new("Employee", "id")
                .with_field(FieldDescriptor::new("id", ScalarType::Uuid).shadow()),
        );
        let err = ModelCatalog::build(model).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(msg) if msg.contains("identity")));
    }

    #[test]
    fn test_duplicate_entity_is_fatal() {
        let model = DomainModel::new()
            .with_entity(
                EntityDescriptor::new("Tag", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid)),
            )
            .with_entity(
                EntityDescriptor::new("TAG", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid)),
            );
        let err = ModelCatalog::build(model).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(msg) if msg.contains("duplicate entity")));
    }

    #[test]
    fn test_is_valid_path() {
        let catalog = ModelCatalog::build(staff_model()).unwrap();
        assert!(catalog.is_valid_path("Employee", "firstName"));
        assert!(catalog.is_valid_path("Employee", "department.name"));
        assert!(catalog.is_valid_path("Employee", "department"));
        assert!(catalog.is_valid_path("employee", "DEPARTMENT.NAME"));
        assert!(!catalog.is_valid_path("Employee", "firstName.x"));
        assert!(!catalog.is_valid_path("Employee", "department.missing"));
        assert!(!catalog.is_valid_path("Order", "id"));
    }
}
