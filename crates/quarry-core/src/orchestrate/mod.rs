//! Public entry point: a request in, a compiled query out.
//!
//! The orchestrator validates filter and sort text before anything is
//! parsed or compiled, converts the limit, parses the path specs, runs the
//! requested compiler, and attaches the clause operations in their fixed
//! order: filter, then sort, then limit, with projection last. The clauses
//! run against the unprojected source, so they may reference fields the
//! projection does not carry.

mod validate;

pub use validate::ClausePolicy;

use quarry_plan::{CompiledQuery, EngineOp};
use tracing::{info, instrument};

use crate::catalog::ModelCatalog;
use crate::compile::{FlatCompiler, GraphCompiler};
use crate::error::Error;
use crate::fieldtree::{FieldTreeParser, DEFAULT_MAX_DEPTH};

/// Which compilation strategy a request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryShape {
    /// One row per root entity, to-many relations nested.
    #[default]
    Graph,
    /// One flat row per leaf combination.
    Flat,
}

/// A caller's query description.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub root_entity: String,
    pub path_specs: Vec<String>,
    pub shape: QueryShape,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub max_depth: usize,
}

impl QueryRequest {
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            path_specs: Vec::new(),
            shape: QueryShape::default(),
            filter: None,
            sort: None,
            limit: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_path(mut self, spec: impl Into<String>) -> Self {
        self.path_specs.push(spec.into());
        self
    }

    pub fn with_paths(mut self, specs: Vec<String>) -> Self {
        self.path_specs.extend(specs);
        self
    }

    pub fn with_shape(mut self, shape: QueryShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A compiled query together with the literal clauses attached to it, kept
/// for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub query: CompiledQuery,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
}

/// Validates, parses, and compiles query requests against one catalog.
pub struct QueryOrchestrator<'a> {
    catalog: &'a ModelCatalog,
    policy: ClausePolicy,
}

impl<'a> QueryOrchestrator<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self {
            catalog,
            policy: ClausePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ClausePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[instrument(skip(self, request), fields(root = %request.root_entity, shape = ?request.shape))]
    pub fn run(&self, request: QueryRequest) -> Result<QueryRun, Error> {
        if let Some(filter) = &request.filter {
            validate::validate_filter(self.catalog, &request.root_entity, filter, self.policy)?;
        }
        if let Some(sort) = &request.sort {
            validate::validate_sort(self.catalog, &request.root_entity, sort, self.policy)?;
        }
        let limit = match request.limit {
            None => None,
            Some(n) if n <= 0 => {
                return Err(Error::InvalidArgument(format!(
                    "limit must be positive, got {n}"
                )))
            }
            Some(n) => match u32::try_from(n) {
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(Error::InvalidArgument(format!("limit {n} out of range")))
                }
            },
        };

        let parser = FieldTreeParser::new(self.catalog);
        let selection =
            parser.parse(&request.root_entity, &request.path_specs, request.max_depth)?;
        let selected = selection.leaf_paths();

        let mut query = match request.shape {
            QueryShape::Graph => CompiledQuery::Graph(
                GraphCompiler::new(self.catalog).compile(selection.root_entity(), &selected)?,
            ),
            QueryShape::Flat => CompiledQuery::Flat(
                FlatCompiler::new(self.catalog).compile(selection.root_entity(), &selected)?,
            ),
        };

        if let Some(filter) = &request.filter {
            query.push_op(EngineOp::Filter(filter.clone()));
        }
        if let Some(sort) = &request.sort {
            query.push_op(EngineOp::Sort(sort.clone()));
        }
        if let Some(limit) = limit {
            query.push_op(EngineOp::Limit(limit));
        }

        info!(
            shape = query.shape_name(),
            ops = query.ops().len(),
            "compiled query"
        );

        Ok(QueryRun {
            query,
            filter: request.filter,
            sort: request.sort,
            limit,
        })
    }
}
