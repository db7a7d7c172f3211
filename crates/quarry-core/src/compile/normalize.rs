//! Selection normalization shared by both compilers.

use std::collections::BTreeSet;

use crate::catalog::{FieldRef, ModelCatalog, RelationMetadata};
use crate::error::Error;
use crate::fieldtree::{Expander, FieldNode, DEFAULT_MAX_DEPTH};

/// Expand a selected path set into pure scalar paths.
///
/// Scalar-final paths are canonicalized and kept as-is. Relation-final paths
/// are expanded to the relation's reachable scalar leaves under the same
/// depth and cycle rules as wildcard parsing: the default depth bound
/// applies, and the entities already crossed by the path (root included)
/// seed the visited set, so a path that closes a cycle contributes nothing.
/// An input set that resolves to no scalar path at all is an error.
pub fn normalize_selection(
    catalog: &ModelCatalog,
    root_entity: &str,
    selected: &BTreeSet<String>,
) -> Result<BTreeSet<String>, Error> {
    let root = catalog.get(root_entity)?;
    let expander = Expander::new(catalog, DEFAULT_MAX_DEPTH)?;
    let mut normalized = BTreeSet::new();

    for path in selected {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = root;
        let mut canonical: Vec<String> = Vec::new();
        let mut crossed: BTreeSet<String> = BTreeSet::from([root.name.clone()]);

        for (i, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                return Err(Error::InvalidPath {
                    path: path.clone(),
                    reason: "empty segment".into(),
                });
            }
            let is_final = i + 1 == segments.len();
            match current.resolve(segment) {
                Some(FieldRef::Scalar(field)) if is_final => {
                    canonical.push(field.name.clone());
                    normalized.insert(canonical.join("."));
                }
                Some(FieldRef::Scalar(field)) => {
                    return Err(Error::InvalidPath {
                        path: path.clone(),
                        reason: format!(
                            "segment '{}' is not a relation on entity {}",
                            field.name, current.name
                        ),
                    });
                }
                Some(FieldRef::Relation(relation)) if is_final => {
                    canonical.push(relation.name.clone());
                    let dotted = canonical.join(".");
                    let node =
                        expander.expand_relation(relation, &dotted, i, &mut crossed)?;
                    collect_scalar_leaves(&node, &mut normalized);
                }
                Some(FieldRef::Relation(relation)) => {
                    canonical.push(relation.name.clone());
                    crossed.insert(relation.target_entity.clone());
                    current = catalog.get(&relation.target_entity)?;
                }
                None => {
                    return Err(Error::InvalidPath {
                        path: path.clone(),
                        reason: format!(
                            "unknown field '{}' on entity {}",
                            segment, current.name
                        ),
                    });
                }
            }
        }
    }

    if normalized.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(normalized)
}

fn collect_scalar_leaves(node: &FieldNode, out: &mut BTreeSet<String>) {
    match node {
        FieldNode::Scalar { path, .. } => {
            out.insert(path.clone());
        }
        FieldNode::Relation { children, .. } => {
            for child in children {
                collect_scalar_leaves(child, out);
            }
        }
    }
}

/// True when `prefix` is a proper dotted prefix of `path`.
pub(super) fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'.'
}

/// Relation metadata for every proper prefix of a normalized scalar path,
/// shallowest first, paired with the entity declaring each relation.
pub(super) fn relation_prefixes(
    catalog: &ModelCatalog,
    root_entity: &str,
    path: &str,
) -> Result<Vec<PrefixRelation>, Error> {
    let mut current = catalog.get(root_entity)?;
    let segments: Vec<&str> = path.split('.').collect();
    let mut prefixes = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i + 1 == segments.len() {
            break;
        }
        let relation = match current.relation(segment) {
            Some(r) => r.clone(),
            None => {
                return Err(Error::InvalidPath {
                    path: path.to_string(),
                    reason: format!(
                        "segment '{}' is not a relation on entity {}",
                        segment, current.name
                    ),
                })
            }
        };
        let owner_entity = current.name.clone();
        current = catalog.get(&relation.target_entity)?;
        prefixes.push(PrefixRelation {
            path: segments[..=i].join("."),
            relation,
            owner_entity,
        });
    }
    Ok(prefixes)
}

/// One relation segment crossed on the way to a scalar leaf.
#[derive(Debug, Clone)]
pub(super) struct PrefixRelation {
    pub path: String,
    pub relation: RelationMetadata,
    pub owner_entity: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        DomainModel, EntityDescriptor, FieldDescriptor, RelationDescriptor, ScalarType,
    };

    fn staff_catalog() -> ModelCatalog {
        let model = DomainModel::new()
            .with_entity(
                EntityDescriptor::new("Employee", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_field(FieldDescriptor::new("firstName", ScalarType::String))
                    .with_relation(RelationDescriptor::to_one("department", "Department")),
            )
            .with_entity(
                EntityDescriptor::new("Department", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_field(FieldDescriptor::new("name", ScalarType::String))
                    .with_relation(RelationDescriptor::to_many("employees", "Employee")),
            );
        ModelCatalog::build(model).unwrap()
    }

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scalar_paths_canonicalized() {
        let catalog = staff_catalog();
        let normalized =
            normalize_selection(&catalog, "Employee", &set(&["FIRSTNAME", "department.NAME"]))
                .unwrap();
        assert_eq!(normalized, set(&["firstName", "department.name"]));
    }

    #[test]
    fn test_relation_final_path_expands() {
        let catalog = staff_catalog();
        let normalized =
            normalize_selection(&catalog, "Employee", &set(&["department"])).unwrap();
        assert_eq!(
            normalized,
            set(&["department.id", "department.name"])
        );
    }

    #[test]
    fn test_cycle_closing_path_contributes_nothing() {
        let catalog = staff_catalog();
        // department.employees re-enters Employee: the expansion truncates
        // and no scalar survives.
        let err = normalize_selection(&catalog, "Employee", &set(&["department.employees"]))
            .unwrap_err();
        assert_eq!(err, Error::EmptySelection);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let catalog = staff_catalog();
        let err = normalize_selection(&catalog, "Employee", &BTreeSet::new()).unwrap_err();
        assert_eq!(err, Error::EmptySelection);
    }

    #[test]
    fn test_invalid_segment_rejected() {
        let catalog = staff_catalog();
        let err = normalize_selection(&catalog, "Employee", &set(&["firstName.x"])).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_is_path_prefix() {
        assert!(is_path_prefix("a", "a.b"));
        assert!(is_path_prefix("a.b", "a.b.c"));
        assert!(!is_path_prefix("a", "a"));
        assert!(!is_path_prefix("a", "ab.c"));
        assert!(!is_path_prefix("a.b", "a"));
    }

    #[test]
    fn test_relation_prefixes() {
        let catalog = staff_catalog();
        let prefixes =
            relation_prefixes(&catalog, "Employee", "department.name").unwrap();
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].path, "department");
        assert_eq!(prefixes[0].owner_entity, "Employee");
        assert_eq!(prefixes[0].relation.target_entity, "Department");
    }
}
