//! Wildcard expansion with depth and cycle bounds.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{ModelCatalog, RelationMetadata};
use crate::error::Error;
use crate::fieldtree::node::FieldNode;

/// Smallest accepted expansion depth.
pub const MIN_DEPTH: usize = 1;
/// Largest accepted expansion depth.
pub const MAX_DEPTH: usize = 10;
/// Depth used when the caller does not supply one.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Expands a relation into its reachable scalar sub-tree.
///
/// Expansion is bounded two ways. The depth bound stops recursion after
/// `max_depth` relation hops. The visited set stops a branch as soon as it
/// would re-enter an entity already on that branch; the set is backtracked
/// after each branch, so sibling branches may legitimately reach the same
/// entity. Both bounds produce a childless `Relation` node and a debug log
/// line, never an error.
#[derive(Debug)]
pub struct Expander<'a> {
    catalog: &'a ModelCatalog,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(catalog: &'a ModelCatalog, max_depth: usize) -> Result<Self, Error> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&max_depth) {
            return Err(Error::InvalidDepth(max_depth));
        }
        Ok(Self { catalog, max_depth })
    }

    /// The validated depth bound.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Expand `relation` rooted at `path`, where `depth` counts the relation
    /// hops already taken to reach it and `visited` holds the entities on
    /// the current branch (the selection root included).
    pub fn expand_relation(
        &self,
        relation: &RelationMetadata,
        path: &str,
        depth: usize,
        visited: &mut BTreeSet<String>,
    ) -> Result<FieldNode, Error> {
        if depth >= self.max_depth {
            debug!(path, "wildcard expansion stopped at depth bound");
            return Ok(self.truncated(relation, path));
        }
        if visited.contains(&relation.target_entity) {
            debug!(
                path,
                entity = %relation.target_entity,
                "wildcard expansion stopped at repeated entity"
            );
            return Ok(self.truncated(relation, path));
        }

        let target = self.catalog.get(&relation.target_entity)?;
        visited.insert(relation.target_entity.clone());

        let mut children = Vec::new();
        for field in target.scalar_fields() {
            children.push(FieldNode::Scalar {
                name: field.name.clone(),
                path: format!("{path}.{}", field.name),
            });
        }
        for child in target.relations() {
            let child_path = format!("{path}.{}", child.name);
            children.push(self.expand_relation(child, &child_path, depth + 1, visited)?);
        }

        visited.remove(&relation.target_entity);
        Ok(FieldNode::Relation {
            name: relation.name.clone(),
            path: path.to_string(),
            cardinality: relation.cardinality,
            children,
        })
    }

    fn truncated(&self, relation: &RelationMetadata, path: &str) -> FieldNode {
        FieldNode::Relation {
            name: relation.name.clone(),
            path: path.to_string(),
            cardinality: relation.cardinality,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        DomainModel, EntityDescriptor, FieldDescriptor, RelationDescriptor, ScalarType,
    };

    fn cyclic_catalog() -> ModelCatalog {
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
                    .with_field(FieldDescriptor::new("budget", ScalarType::Int64))
                    .with_relation(RelationDescriptor::to_many("employees", "Employee")),
            );
        ModelCatalog::build(model).unwrap()
    }

    fn diamond_catalog() -> ModelCatalog {
        let model = DomainModel::new()
            .with_entity(
                EntityDescriptor::new("A", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_relation(RelationDescriptor::to_one("b", "B"))
                    .with_relation(RelationDescriptor::to_one("c", "C")),
            )
            .with_entity(
                EntityDescriptor::new("B", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_relation(RelationDescriptor::to_one("d", "D")),
            )
            .with_entity(
                EntityDescriptor::new("C", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid))
                    .with_relation(RelationDescriptor::to_one("d", "D")),
            )
            .with_entity(
                EntityDescriptor::new("D", "id")
                    .with_field(FieldDescriptor::new("id", ScalarType::Uuid)),
            );
        ModelCatalog::build(model).unwrap()
    }

    fn max_tree_depth(node: &FieldNode, depth: usize) -> usize {
        node.children()
            .iter()
            .map(|c| max_tree_depth(c, depth + 1))
            .max()
            .unwrap_or(depth)
    }

    #[test]
    fn test_depth_out_of_range() {
        let catalog = cyclic_catalog();
        assert_eq!(
            Expander::new(&catalog, 0).unwrap_err(),
            Error::InvalidDepth(0)
        );
        assert_eq!(
            Expander::new(&catalog, 11).unwrap_err(),
            Error::InvalidDepth(11)
        );
        assert!(Expander::new(&catalog, 1).is_ok());
        assert!(Expander::new(&catalog, 10).is_ok());
    }

    #[test]
    fn test_depth_bound_truncates() {
        let catalog = cyclic_catalog();
        let expander = Expander::new(&catalog, 1).unwrap();
        let employee = catalog.get("Employee").unwrap();
        let department = employee.relation("department").unwrap();

        let mut visited = BTreeSet::from(["Employee".to_string()]);
        let node = expander
            .expand_relation(department, "department", 0, &mut visited)
            .unwrap();

        // One hop of scalars, then childless markers.
        assert!(max_tree_depth(&node, 0) <= 1);
        let employees = node
            .children()
            .iter()
            .find(|c| c.name() == "employees")
            .unwrap();
        assert!(employees.is_relation());
        assert!(employees.children().is_empty());
    }

    #[test]
    fn test_cycle_truncates_repeated_entity() {
        let catalog = cyclic_catalog();
        let expander = Expander::new(&catalog, 10).unwrap();
        let employee = catalog.get("Employee").unwrap();
        let department = employee.relation("department").unwrap();

        let mut visited = BTreeSet::from(["Employee".to_string()]);
        let node = expander
            .expand_relation(department, "department", 0, &mut visited)
            .unwrap();

        // department expands fully, employees would re-enter Employee.
        assert!(node.children().iter().any(|c| c.path() == "department.name"));
        assert!(node.children().iter().any(|c| c.path() == "department.budget"));
        let employees = node
            .children()
            .iter()
            .find(|c| c.name() == "employees")
            .unwrap();
        assert!(employees.children().is_empty());
        // Backtracked after expansion.
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_sibling_branches_have_independent_visited_sets() {
        let catalog = diamond_catalog();
        let expander = Expander::new(&catalog, 5).unwrap();
        let a = catalog.get("A").unwrap();

        let mut visited = BTreeSet::from(["A".to_string()]);
        let b = expander
            .expand_relation(a.relation("b").unwrap(), "b", 0, &mut visited)
            .unwrap();
        let c = expander
            .expand_relation(a.relation("c").unwrap(), "c", 0, &mut visited)
            .unwrap();

        // D is reachable through both branches.
        let b_d = b.children().iter().find(|n| n.name() == "d").unwrap();
        let c_d = c.children().iter().find(|n| n.name() == "d").unwrap();
        assert!(!b_d.children().is_empty());
        assert!(!c_d.children().is_empty());
    }
}
