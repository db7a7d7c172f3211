//! Path spec parsing.

use std::collections::BTreeSet;

use crate::catalog::{EntityMetadata, FieldRef, ModelCatalog, RelationMetadata};
use crate::error::Error;
use crate::fieldtree::expand::{Expander, DEFAULT_MAX_DEPTH};
use crate::fieldtree::node::{FieldNode, FieldSelection};

/// Turns caller-supplied path specs into a validated [`FieldSelection`].
///
/// A spec is either a bare name or a dotted path. Bare scalar names become
/// scalar leaves. A bare relation name is a wildcard and expands into the
/// relation's reachable scalar sub-tree, bounded by depth and by repeated
/// entities per branch. Dotted paths are explicit: every non-final segment
/// must be a relation, and the final node is emitted as written, without
/// further expansion.
///
/// Names match case-insensitively; the produced tree always carries the
/// canonical spelling from the catalog.
pub struct FieldTreeParser<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> FieldTreeParser<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    /// Parse with the default depth bound.
    pub fn parse_default(
        &self,
        root_entity: &str,
        specs: &[String],
    ) -> Result<FieldSelection, Error> {
        self.parse(root_entity, specs, DEFAULT_MAX_DEPTH)
    }

    pub fn parse(
        &self,
        root_entity: &str,
        specs: &[String],
        max_depth: usize,
    ) -> Result<FieldSelection, Error> {
        let expander = Expander::new(self.catalog, max_depth)?;
        let root = self.catalog.get(root_entity)?;

        let mut fields = Vec::new();
        for spec in specs {
            let spec = spec.trim();
            if spec.is_empty() {
                return Err(Error::InvalidPath {
                    path: spec.to_string(),
                    reason: "empty path".into(),
                });
            }
            let node = if spec.contains('.') {
                self.parse_dotted(root, spec)?
            } else {
                self.parse_simple(root, spec, &expander)?
            };
            fields.push(node);
        }

        Ok(FieldSelection::new(root.name.clone(), fields, max_depth))
    }

    fn parse_simple(
        &self,
        root: &EntityMetadata,
        spec: &str,
        expander: &Expander<'_>,
    ) -> Result<FieldNode, Error> {
        match root.resolve(spec) {
            Some(FieldRef::Scalar(field)) => Ok(FieldNode::Scalar {
                name: field.name.clone(),
                path: field.name.clone(),
            }),
            Some(FieldRef::Relation(relation)) => {
                let mut visited = BTreeSet::from([root.name.clone()]);
                expander.expand_relation(relation, &relation.name, 0, &mut visited)
            }
            None => Err(Error::InvalidPath {
                path: spec.to_string(),
                reason: format!("unknown field '{}' on entity {}", spec, root.name),
            }),
        }
    }

    fn parse_dotted(&self, root: &EntityMetadata, spec: &str) -> Result<FieldNode, Error> {
        let segments: Vec<&str> = spec.split('.').collect();
        let mut current = root;
        let mut canonical: Vec<String> = Vec::new();
        let mut relations: Vec<&RelationMetadata> = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                return Err(Error::InvalidPath {
                    path: spec.to_string(),
                    reason: "empty segment".into(),
                });
            }
            let is_final = i + 1 == segments.len();
            match current.resolve(segment) {
                Some(FieldRef::Scalar(field)) if is_final => {
                    canonical.push(field.name.clone());
                }
                Some(FieldRef::Scalar(field)) => {
                    return Err(Error::InvalidPath {
                        path: spec.to_string(),
                        reason: format!(
                            "segment '{}' is not a relation on entity {}",
                            field.name, current.name
                        ),
                    });
                }
                Some(FieldRef::Relation(relation)) => {
                    canonical.push(relation.name.clone());
                    relations.push(relation);
                    if !is_final {
                        current = self.catalog.get(&relation.target_entity)?;
                    }
                }
                None => {
                    return Err(Error::InvalidPath {
                        path: spec.to_string(),
                        reason: format!(
                            "unknown field '{}' on entity {}",
                            segment, current.name
                        ),
                    });
                }
            }
        }

        let paths: Vec<String> = (0..canonical.len())
            .map(|i| canonical[..=i].join("."))
            .collect();
        let last = segments.len() - 1;
        let final_is_scalar = relations.len() < segments.len();

        // The final node is emitted as written; an explicit relation leaf
        // stays childless rather than being wildcarded.
        let mut node = if final_is_scalar {
            FieldNode::Scalar {
                name: canonical[last].clone(),
                path: paths[last].clone(),
            }
        } else {
            let relation = relations[relations.len() - 1];
            FieldNode::Relation {
                name: relation.name.clone(),
                path: paths[last].clone(),
                cardinality: relation.cardinality,
                children: Vec::new(),
            }
        };

        let ancestors = if final_is_scalar {
            relations.len()
        } else {
            relations.len() - 1
        };
        for i in (0..ancestors).rev() {
            node = FieldNode::Relation {
                name: relations[i].name.clone(),
                path: paths[i].clone(),
                cardinality: relations[i].cardinality,
                children: vec![node],
            };
        }
        Ok(node)
    }
}
