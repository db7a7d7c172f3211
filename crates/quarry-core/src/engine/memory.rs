//! An in-memory engine over catalog-validated instances.
//!
//! [`MemoryEngine`] stores entity instances keyed by [`InstanceId`] and
//! executes compiled queries against them through the session contract.
//! Filter and sort clauses are parsed and evaluated per root, flat joins are
//! built by walking the pairing structure one step at a time, and both
//! output shapes materialize straight into result rows. Missing to-one links
//! read as null in projections and drop rows in flat joins.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use quarry_lang::{parse_filter, parse_sort, SortDirection};
use quarry_plan::{
    plan_text, CompiledFlatQuery, CompiledGraphQuery, CompiledQuery, EngineError, EngineOp,
    EngineSession, FlatAccessor, FlatJoinStep, FlatProjection, FlatResultSet, GraphProjection,
    GraphRow, IncludePath, JoinRow, ProjectionSpec, RelationalEngine, ResultSet, RowCollection,
    RowField, RowLink, Value,
};
use tracing::debug;

use super::eval::{evaluate, sort_cmp};
use crate::catalog::{FieldRef, ModelCatalog};

/// Identifier of one stored instance, unique across all entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

#[derive(Debug)]
struct Instance {
    fields: BTreeMap<String, Value>,
    to_one: BTreeMap<String, InstanceId>,
    to_many: BTreeMap<String, Vec<InstanceId>>,
}

/// An instance store validated against a [`ModelCatalog`].
///
/// Inserts canonicalize field names and reject anything the catalog does not
/// know; links are checked against relation cardinality and target entity.
pub struct MemoryEngine<'a> {
    catalog: &'a ModelCatalog,
    stores: BTreeMap<String, BTreeMap<InstanceId, Instance>>,
    index: BTreeMap<InstanceId, String>,
    next_id: u64,
}

impl<'a> MemoryEngine<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self {
            catalog,
            stores: BTreeMap::new(),
            index: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Store an instance of `entity` and return its id.
    pub fn insert(
        &mut self,
        entity: &str,
        fields: Vec<(&str, Value)>,
    ) -> Result<InstanceId, EngineError> {
        let meta = self
            .catalog
            .get(entity)
            .map_err(|_| EngineError::UnknownEntity(entity.to_string()))?;
        let mut stored = BTreeMap::new();
        for (name, value) in fields {
            let field = meta
                .field(name)
                .ok_or_else(|| EngineError::UnknownField(format!("{}.{}", meta.name, name)))?;
            stored.insert(field.name.clone(), value);
        }
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        let canonical = meta.name.clone();
        self.stores.entry(canonical.clone()).or_default().insert(
            id,
            Instance {
                fields: stored,
                to_one: BTreeMap::new(),
                to_many: BTreeMap::new(),
            },
        );
        self.index.insert(id, canonical);
        Ok(id)
    }

    /// Link `from` to `to` through a named relation.
    ///
    /// A to-one relation is replaced on relink; a to-many relation appends.
    pub fn link(
        &mut self,
        from: InstanceId,
        relation: &str,
        to: InstanceId,
    ) -> Result<(), EngineError> {
        let from_entity = self
            .index
            .get(&from)
            .ok_or_else(|| EngineError::Backend(format!("no instance {from:?}")))?
            .clone();
        let to_entity = self
            .index
            .get(&to)
            .ok_or_else(|| EngineError::Backend(format!("no instance {to:?}")))?
            .clone();
        let meta = self
            .catalog
            .get(&from_entity)
            .map_err(|_| EngineError::UnknownEntity(from_entity.clone()))?;
        let rel = meta
            .relation(relation)
            .ok_or_else(|| EngineError::UnknownField(format!("{}.{}", meta.name, relation)))?;
        if rel.target_entity != to_entity {
            return Err(EngineError::Backend(format!(
                "relation {}.{} links {}, got {}",
                meta.name, rel.name, rel.target_entity, to_entity
            )));
        }
        let name = rel.name.clone();
        let is_many = rel.cardinality.is_to_many();
        let instance = self
            .stores
            .get_mut(&from_entity)
            .and_then(|store| store.get_mut(&from))
            .ok_or_else(|| EngineError::Backend(format!("no instance {from:?}")))?;
        if is_many {
            instance.to_many.entry(name).or_default().push(to);
        } else {
            instance.to_one.insert(name, to);
        }
        Ok(())
    }

    fn instance(&self, entity: &str, id: InstanceId) -> Option<&Instance> {
        self.stores.get(entity)?.get(&id)
    }

    fn instance_by_id(&self, id: InstanceId) -> Option<&Instance> {
        let entity = self.index.get(&id)?;
        self.stores.get(entity)?.get(&id)
    }

    /// Read a dotted path from an instance. Intermediate segments must be
    /// to-one relations; a missing link reads as `Ok(None)`.
    fn read_path(
        &self,
        id: InstanceId,
        entity: &str,
        path: &str,
    ) -> Result<Option<Value>, EngineError> {
        let mut meta = self
            .catalog
            .get(entity)
            .map_err(|_| EngineError::UnknownEntity(entity.to_string()))?;
        let mut current = match self.instance(meta.name.as_str(), id) {
            Some(instance) => instance,
            None => return Ok(None),
        };
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            match meta.resolve(segment) {
                Some(FieldRef::Scalar(field)) if last => {
                    return Ok(current.fields.get(field.name.as_str()).cloned());
                }
                Some(FieldRef::Scalar(field)) => {
                    return Err(EngineError::Clause(format!(
                        "'{}' is not a relation on {}",
                        field.name, meta.name
                    )));
                }
                Some(FieldRef::Relation(relation)) => {
                    if relation.cardinality.is_to_many() {
                        return Err(EngineError::Clause(format!(
                            "cannot read through collection '{}' on {}",
                            relation.name, meta.name
                        )));
                    }
                    if last {
                        return Err(EngineError::Clause(format!(
                            "'{}' is a relation, not a scalar field",
                            relation.name
                        )));
                    }
                    match current.to_one.get(relation.name.as_str()) {
                        Some(&next_id) => {
                            let target = relation.target_entity.clone();
                            meta = self
                                .catalog
                                .get(&target)
                                .map_err(|_| EngineError::UnknownEntity(target.clone()))?;
                            current = match self.instance(meta.name.as_str(), next_id) {
                                Some(instance) => instance,
                                None => return Ok(None),
                            };
                        }
                        None => return Ok(None),
                    }
                }
                None => {
                    return Err(EngineError::UnknownField(format!(
                        "{}.{}",
                        meta.name, segment
                    )));
                }
            }
        }
        Ok(None)
    }

    fn project_graph_level(
        &self,
        id: InstanceId,
        entity: &str,
        path: &str,
        fields: &[String],
        projection: &GraphProjection,
    ) -> Result<GraphRow, EngineError> {
        let meta = self
            .catalog
            .get(entity)
            .map_err(|_| EngineError::UnknownEntity(entity.to_string()))?;
        let instance = self
            .instance(meta.name.as_str(), id)
            .ok_or_else(|| EngineError::Backend(format!("no instance {id:?} in {}", meta.name)))?;

        let mut row = GraphRow::new(meta.name.clone());
        for field in fields {
            let value = instance.fields.get(field).cloned().unwrap_or(Value::Null);
            row.values.push(RowField {
                name: field.clone(),
                value,
            });
        }

        for group in projection.children_of(path) {
            let name = group.name().to_string();
            let relation = meta.relation(&name).ok_or_else(|| {
                EngineError::Projection(format!("unknown relation {}.{}", meta.name, name))
            })?;
            if relation.cardinality.is_to_many() {
                let ids = instance
                    .to_many
                    .get(relation.name.as_str())
                    .cloned()
                    .unwrap_or_default();
                let mut rows = Vec::with_capacity(ids.len());
                for child in ids {
                    rows.push(self.project_graph_level(
                        child,
                        &group.entity,
                        &group.path,
                        &group.fields,
                        projection,
                    )?);
                }
                row.to_many.push(RowCollection { name, rows });
            } else {
                let child = match instance.to_one.get(relation.name.as_str()) {
                    Some(&child) => Some(Box::new(self.project_graph_level(
                        child,
                        &group.entity,
                        &group.path,
                        &group.fields,
                        projection,
                    )?)),
                    None => None,
                };
                row.to_one.push(RowLink { name, row: child });
            }
        }
        Ok(row)
    }

    fn execute_graph(
        &self,
        entity: &str,
        roots: &[InstanceId],
        projection: &GraphProjection,
        distinct: bool,
    ) -> Result<ResultSet, EngineError> {
        let mut rows = Vec::with_capacity(roots.len());
        for &id in roots {
            rows.push(self.project_graph_level(id, entity, "", &projection.fields, projection)?);
        }
        if distinct {
            let mut deduped: Vec<GraphRow> = Vec::with_capacity(rows.len());
            for row in rows {
                if !deduped.contains(&row) {
                    deduped.push(row);
                }
            }
            rows = deduped;
        }
        debug!(rows = rows.len(), "materialized graph result");
        Ok(ResultSet::Graph(rows))
    }

    fn execute_flat(
        &self,
        roots: &[InstanceId],
        joins: &[FlatJoinStep],
        projection: &FlatProjection,
    ) -> Result<ResultSet, EngineError> {
        let mut rows: Vec<JoinRow<InstanceId>> =
            roots.iter().map(|&id| JoinRow::Leaf(id)).collect();
        for step in joins {
            let mut next = Vec::new();
            for row in rows {
                let anchor = *row.element_at(step.outer_hops);
                let Some(mut current) = self.instance_by_id(anchor) else {
                    continue;
                };
                // Cross the to-one hops between the anchor element and the
                // collection owner; a missing link drops the row.
                let mut reachable = true;
                for via in &step.via {
                    match current
                        .to_one
                        .get(via.as_str())
                        .and_then(|&next_id| self.instance_by_id(next_id))
                    {
                        Some(next_instance) => current = next_instance,
                        None => {
                            reachable = false;
                            break;
                        }
                    }
                }
                if !reachable {
                    continue;
                }
                let Some(elements) = current.to_many.get(step.relation.as_str()) else {
                    continue;
                };
                for &element in elements {
                    next.push(JoinRow::pair(row.clone(), element));
                }
            }
            rows = next;
        }

        let columns: Vec<String> = projection
            .fields
            .iter()
            .map(|field| field.alias.clone())
            .collect();
        let mut result = FlatResultSet::new(columns);
        for row in &rows {
            let mut out = Vec::with_capacity(projection.fields.len());
            for field in &projection.fields {
                out.push(self.read_accessor(row, &field.accessor));
            }
            // Joins can repeat combinations; flat output is always distinct.
            if !result.rows.contains(&out) {
                result.push_row(out);
            }
        }
        debug!(
            joined = rows.len(),
            rows = result.rows.len(),
            "materialized flat result"
        );
        Ok(ResultSet::Flat(result))
    }

    fn read_accessor(&self, row: &JoinRow<InstanceId>, accessor: &FlatAccessor) -> Value {
        let Some((field_name, hops)) = accessor.segments.split_last() else {
            return Value::Null;
        };
        let anchor = *row.element_at(accessor.outer_hops);
        let Some(mut current) = self.instance_by_id(anchor) else {
            return Value::Null;
        };
        for hop in hops {
            match current
                .to_one
                .get(hop.as_str())
                .and_then(|&id| self.instance_by_id(id))
            {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        current
            .fields
            .get(field_name.as_str())
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl RelationalEngine for MemoryEngine<'_> {
    fn open(&self, source: &str) -> Result<Box<dyn EngineSession + '_>, EngineError> {
        let meta = self
            .catalog
            .get(source)
            .map_err(|_| EngineError::UnknownEntity(source.to_string()))?;
        let roots: Vec<InstanceId> = self
            .stores
            .get(meta.name.as_str())
            .map(|store| store.keys().copied().collect())
            .unwrap_or_default();
        debug!(entity = %meta.name, roots = roots.len(), "opened session");
        Ok(Box::new(MemorySession {
            engine: self,
            entity: meta.name.clone(),
            roots,
            ops: Vec::new(),
            projection: None,
        }))
    }
}

/// Projection owned by the session until materialization.
enum StagedProjection {
    Graph {
        projection: GraphProjection,
        includes: Vec<IncludePath>,
        distinct: bool,
    },
    Flat {
        joins: Vec<FlatJoinStep>,
        projection: FlatProjection,
    },
}

struct MemorySession<'e, 'c> {
    engine: &'e MemoryEngine<'c>,
    entity: String,
    roots: Vec<InstanceId>,
    ops: Vec<EngineOp>,
    projection: Option<StagedProjection>,
}

impl EngineSession for MemorySession<'_, '_> {
    fn apply_filter(&mut self, predicate: &str) -> Result<(), EngineError> {
        let expr = parse_filter(predicate).map_err(|e| EngineError::Clause(e.to_string()))?;
        let mut kept = Vec::with_capacity(self.roots.len());
        for &id in &self.roots {
            let resolve = |path: &str| self.engine.read_path(id, &self.entity, path);
            if evaluate(&expr, &resolve)? {
                kept.push(id);
            }
        }
        debug!(kept = kept.len(), total = self.roots.len(), "applied filter");
        self.roots = kept;
        self.ops.push(EngineOp::Filter(predicate.to_string()));
        Ok(())
    }

    fn apply_sort(&mut self, keys: &str) -> Result<(), EngineError> {
        let parsed = parse_sort(keys).map_err(|e| EngineError::Clause(e.to_string()))?;
        let mut decorated: Vec<(Vec<Option<Value>>, InstanceId)> =
            Vec::with_capacity(self.roots.len());
        for &id in &self.roots {
            let mut key_values = Vec::with_capacity(parsed.len());
            for key in &parsed {
                key_values.push(
                    self.engine
                        .read_path(id, &self.entity, &key.path.dotted())?,
                );
            }
            decorated.push((key_values, id));
        }
        // Stable sort: equal keys keep their prior relative order.
        decorated.sort_by(|(a, _), (b, _)| {
            for (i, key) in parsed.iter().enumerate() {
                let ord = sort_cmp(a[i].as_ref(), b[i].as_ref());
                let ord = match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        self.roots = decorated.into_iter().map(|(_, id)| id).collect();
        self.ops.push(EngineOp::Sort(keys.to_string()));
        Ok(())
    }

    fn apply_limit(&mut self, limit: u32) -> Result<(), EngineError> {
        self.roots.truncate(limit as usize);
        self.ops.push(EngineOp::Limit(limit));
        Ok(())
    }

    fn apply_projection(&mut self, spec: ProjectionSpec<'_>) -> Result<(), EngineError> {
        self.projection = Some(match spec {
            ProjectionSpec::Graph {
                projection,
                includes,
                distinct,
            } => StagedProjection::Graph {
                projection: projection.clone(),
                includes: includes.to_vec(),
                distinct,
            },
            ProjectionSpec::Flat { joins, projection } => StagedProjection::Flat {
                joins: joins.to_vec(),
                projection: projection.clone(),
            },
        });
        Ok(())
    }

    fn execute_and_materialize(self: Box<Self>) -> Result<ResultSet, EngineError> {
        let session = *self;
        let Some(staged) = session.projection else {
            return Err(EngineError::Projection("no projection staged".into()));
        };
        match staged {
            StagedProjection::Graph {
                projection,
                distinct,
                ..
            } => session
                .engine
                .execute_graph(&session.entity, &session.roots, &projection, distinct),
            StagedProjection::Flat { joins, projection } => {
                session
                    .engine
                    .execute_flat(&session.roots, &joins, &projection)
            }
        }
    }

    fn explain(&self) -> String {
        match &self.projection {
            Some(StagedProjection::Graph {
                projection,
                includes,
                distinct,
            }) => {
                let query = CompiledQuery::Graph(CompiledGraphQuery {
                    source: self.entity.clone(),
                    ops: self.ops.clone(),
                    includes: includes.clone(),
                    projection: projection.clone(),
                    distinct: *distinct,
                });
                format!("{}\n\nStaged roots: {}", plan_text(&query), self.roots.len())
            }
            Some(StagedProjection::Flat { joins, projection }) => {
                let query = CompiledQuery::Flat(CompiledFlatQuery {
                    source: self.entity.clone(),
                    ops: self.ops.clone(),
                    joins: joins.clone(),
                    projection: projection.clone(),
                });
                format!("{}\n\nStaged roots: {}", plan_text(&query), self.roots.len())
            }
            None => format!(
                "Session on {}: {} roots staged, {} ops",
                self.entity,
                self.roots.len(),
                self.ops.len()
            ),
        }
    }
}
