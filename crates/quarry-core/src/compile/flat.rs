//! Flattening compilation.

use std::collections::{BTreeMap, BTreeSet};

use quarry_plan::{CompiledFlatQuery, FlatAccessor, FlatField, FlatJoinStep, FlatProjection};
use tracing::debug;

use crate::catalog::ModelCatalog;
use crate::compile::normalize::{is_path_prefix, normalize_selection, relation_prefixes};
use crate::error::Error;

/// Compiles a selected path set into one flat row per leaf combination.
///
/// Every collection boundary crossed by the selection becomes a join step,
/// ordered outer-to-inner. Each step is anchored at the deepest earlier
/// boundary on its own path prefix (or at the root when it has none);
/// `outer_hops` counts the walk from the top of the pairing structure built
/// so far back to that anchor. Projected fields are aliased by their
/// underscore-joined path, and the engine always deduplicates the flat
/// output.
pub struct FlatCompiler<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> FlatCompiler<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    pub fn compile(
        &self,
        root_entity: &str,
        selected: &BTreeSet<String>,
    ) -> Result<CompiledFlatQuery, Error> {
        let root = self.catalog.get(root_entity)?;
        let paths = normalize_selection(self.catalog, root_entity, selected)?;

        // Collection boundaries: every distinct prefix crossing a to-many
        // relation, with its element entity.
        let mut boundary_map: BTreeMap<String, String> = BTreeMap::new();
        for path in &paths {
            for prefix in relation_prefixes(self.catalog, root_entity, path)? {
                if prefix.relation.cardinality.is_to_many() {
                    boundary_map
                        .entry(prefix.path)
                        .or_insert(prefix.relation.target_entity);
                }
            }
        }
        let segment_count = |p: &str| p.matches('.').count();
        let mut boundaries: Vec<(String, String)> = boundary_map.into_iter().collect();
        boundaries.sort_by(|a, b| {
            segment_count(&a.0)
                .cmp(&segment_count(&b.0))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut joins: Vec<FlatJoinStep> = Vec::new();
        for (i, (path, _)) in boundaries.iter().enumerate() {
            let ancestors: Vec<usize> = (0..i)
                .filter(|&j| is_path_prefix(&boundaries[j].0, path))
                .collect();
            let common_ancestor_depth = ancestors.len() as u32;

            // The deepest boundary on this path's own prefix anchors the
            // join; its element sits i-1-j outer hops from the row top.
            // Without one, the anchor is the root element, i hops out.
            let (outer_hops, anchor_entity, tail_start) = match ancestors.last() {
                Some(&j) => (
                    (i - 1 - j) as u32,
                    boundaries[j].1.as_str(),
                    boundaries[j].0.len() + 1,
                ),
                None => (i as u32, root.name.as_str(), 0),
            };

            // Resolve the remaining segments against the original entity at
            // the anchor: to-one hops, then the joined to-many relation. Any
            // failure here means boundary discovery and anchoring disagree.
            let segments: Vec<&str> = path[tail_start..].split('.').collect();
            let mut current = self.catalog.get(anchor_entity)?;
            let mut via: Vec<String> = Vec::new();
            for (k, segment) in segments.iter().enumerate() {
                let Some(relation) = current.relation(segment) else {
                    return Err(Error::UnresolvableJoin(path.clone()));
                };
                if k + 1 == segments.len() {
                    if !relation.cardinality.is_to_many() {
                        return Err(Error::UnresolvableJoin(path.clone()));
                    }
                    joins.push(FlatJoinStep {
                        path: path.clone(),
                        relation: relation.name.clone(),
                        source_entity: current.name.clone(),
                        target_entity: relation.target_entity.clone(),
                        level: i as u32,
                        common_ancestor_depth,
                        outer_hops,
                        via: via.clone(),
                    });
                } else {
                    if relation.cardinality.is_to_many() {
                        return Err(Error::UnresolvableJoin(path.clone()));
                    }
                    via.push(relation.name.clone());
                    current = self.catalog.get(&relation.target_entity)?;
                }
            }
        }

        // Map each scalar path to its position in the final pairing shape.
        let total = boundaries.len();
        let mut fields: Vec<FlatField> = Vec::new();
        for path in &paths {
            let owner = (0..total)
                .filter(|&j| is_path_prefix(&boundaries[j].0, path))
                .last();
            let (outer_hops, boundary, segments) = match owner {
                Some(j) => (
                    (total - 1 - j) as u32,
                    Some(boundaries[j].0.clone()),
                    path[boundaries[j].0.len() + 1..]
                        .split('.')
                        .map(str::to_string)
                        .collect(),
                ),
                None => (
                    total as u32,
                    None,
                    path.split('.').map(str::to_string).collect(),
                ),
            };
            fields.push(FlatField {
                accessor: FlatAccessor {
                    outer_hops,
                    boundary,
                    segments,
                },
                alias: path.replace('.', "_"),
            });
        }

        debug!(
            root = %root.name,
            boundaries = joins.len(),
            fields = fields.len(),
            "compiled flattening query"
        );

        Ok(CompiledFlatQuery {
            source: root.name.clone(),
            ops: Vec::new(),
            joins,
            projection: FlatProjection { fields },
        })
    }
}
