//! Graph-preserving compilation.

use std::collections::{BTreeMap, BTreeSet};

use quarry_plan::{
    Cardinality, CompiledGraphQuery, GraphProjection, IncludePath, ProjectionGroup,
};
use tracing::debug;

use crate::catalog::ModelCatalog;
use crate::compile::normalize::{is_path_prefix, normalize_selection, relation_prefixes};
use crate::error::Error;

/// Compiles a selected path set into a query that keeps the entity graph
/// shape: one row per root entity, to-many relations as nested collections.
///
/// The compiled query eager-loads exactly the relation chains needed to
/// reach selected scalars and projects, per level, only the scalars selected
/// at that level. Result deduplication is requested only when the selection
/// crosses no to-many relation; an engine cannot deduplicate rows that carry
/// nested collections.
pub struct GraphCompiler<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> GraphCompiler<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    pub fn compile(
        &self,
        root_entity: &str,
        selected: &BTreeSet<String>,
    ) -> Result<CompiledGraphQuery, Error> {
        let root = self.catalog.get(root_entity)?;
        let paths = normalize_selection(self.catalog, root_entity, selected)?;

        let mut include_map: BTreeMap<String, (String, Cardinality)> = BTreeMap::new();
        let mut group_fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut root_fields: Vec<String> = Vec::new();
        let mut any_to_many = false;

        for path in &paths {
            let prefixes = relation_prefixes(self.catalog, root_entity, path)?;
            match prefixes.last() {
                None => root_fields.push(path.clone()),
                Some(owner) => {
                    let field = path[owner.path.len() + 1..].to_string();
                    group_fields
                        .entry(owner.path.clone())
                        .or_default()
                        .push(field);
                }
            }
            for prefix in &prefixes {
                if prefix.relation.cardinality.is_to_many() {
                    any_to_many = true;
                }
                include_map.entry(prefix.path.clone()).or_insert_with(|| {
                    (
                        prefix.relation.target_entity.clone(),
                        prefix.relation.cardinality,
                    )
                });
            }
        }

        // Keep only chains no other include extends; loading "a.b" already
        // traverses "a".
        let mut includes: Vec<IncludePath> = include_map
            .iter()
            .filter(|(path, _)| !include_map.keys().any(|other| is_path_prefix(path, other)))
            .map(|(path, (entity, cardinality))| {
                IncludePath::new(path.clone(), entity.clone(), *cardinality)
            })
            .collect();
        includes.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path.cmp(&b.path)));

        // Every crossed prefix gets a group, even one with no direct scalar
        // selection, so engines can rebuild the nesting from paths alone.
        let segment_count = |p: &str| p.matches('.').count();
        let mut groups: Vec<ProjectionGroup> = include_map
            .iter()
            .map(|(path, (entity, cardinality))| {
                let mut group = ProjectionGroup::new(path.clone(), entity.clone(), *cardinality);
                if let Some(fields) = group_fields.get(path) {
                    for field in fields {
                        group = group.with_field(field.clone());
                    }
                }
                group
            })
            .collect();
        groups.sort_by(|a, b| {
            segment_count(&a.path)
                .cmp(&segment_count(&b.path))
                .then_with(|| a.path.cmp(&b.path))
        });

        let mut projection = GraphProjection::new(root.name.clone());
        for field in root_fields {
            projection = projection.with_field(field);
        }
        for group in groups {
            projection = projection.with_group(group);
        }

        let distinct = !any_to_many;
        debug!(
            root = %root.name,
            scalars = projection.scalar_count(),
            includes = includes.len(),
            distinct,
            "compiled graph-preserving query"
        );

        Ok(CompiledGraphQuery {
            source: root.name.clone(),
            ops: Vec::new(),
            includes,
            projection,
            distinct,
        })
    }
}
