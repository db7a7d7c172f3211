//! The outbound engine contract.
//!
//! A [`RelationalEngine`] opens one [`EngineSession`] per query. The session
//! receives clause operations in a fixed order (filter, then sort, then
//! limit), all applied against the unprojected source entity, then the
//! projection, and finally materializes. [`CompiledQuery::execute_on`] drives
//! that sequence so callers and engines cannot disagree on it.

use crate::error::EngineError;
use crate::query::{
    CompiledQuery, EngineOp, FlatJoinStep, FlatProjection, GraphProjection, IncludePath,
};
use crate::result::ResultSet;

/// The projection half of a compiled query, borrowed for handoff to a session.
#[derive(Debug, Clone, Copy)]
pub enum ProjectionSpec<'a> {
    /// Graph-preserving: eager-load set plus nested projection groups.
    Graph {
        projection: &'a GraphProjection,
        includes: &'a [IncludePath],
        distinct: bool,
    },
    /// Flattening: ordered join steps plus a flat projection.
    Flat {
        joins: &'a [FlatJoinStep],
        projection: &'a FlatProjection,
    },
}

/// One in-flight query against an engine.
///
/// Sessions are single-use: operations stage work, and
/// [`execute_and_materialize`](Self::execute_and_materialize) consumes the
/// session to produce the result.
pub trait EngineSession {
    /// Filter the unprojected source by a predicate text.
    fn apply_filter(&mut self, predicate: &str) -> Result<(), EngineError>;

    /// Sort the unprojected source by a sort-key list text.
    fn apply_sort(&mut self, keys: &str) -> Result<(), EngineError>;

    /// Keep at most `limit` root rows.
    fn apply_limit(&mut self, limit: u32) -> Result<(), EngineError>;

    /// Stage the projection to materialize with.
    fn apply_projection(&mut self, spec: ProjectionSpec<'_>) -> Result<(), EngineError>;

    /// Run the staged query and materialize the result.
    fn execute_and_materialize(self: Box<Self>) -> Result<ResultSet, EngineError>;

    /// Human-readable description of the staged query. Diagnostics only;
    /// the text is never parsed.
    fn explain(&self) -> String;
}

/// A query executor that can open sessions against named entities.
pub trait RelationalEngine {
    /// Open a session against a source entity.
    fn open(&self, source: &str) -> Result<Box<dyn EngineSession + '_>, EngineError>;
}

impl CompiledQuery {
    /// Borrow the projection half of this query for session handoff.
    pub fn projection_spec(&self) -> ProjectionSpec<'_> {
        match self {
            CompiledQuery::Graph(q) => ProjectionSpec::Graph {
                projection: &q.projection,
                includes: &q.includes,
                distinct: q.distinct,
            },
            CompiledQuery::Flat(q) => ProjectionSpec::Flat {
                joins: &q.joins,
                projection: &q.projection,
            },
        }
    }

    /// Execute this query against an engine.
    ///
    /// Opens a session, applies the clause operations in their compiled
    /// order, stages the projection, and materializes.
    pub fn execute_on(&self, engine: &impl RelationalEngine) -> Result<ResultSet, EngineError> {
        let mut session = engine.open(self.source())?;
        for op in self.ops() {
            match op {
                EngineOp::Filter(predicate) => session.apply_filter(predicate)?,
                EngineOp::Sort(keys) => session.apply_sort(keys)?,
                EngineOp::Limit(limit) => session.apply_limit(*limit)?,
            }
        }
        session.apply_projection(self.projection_spec())?;
        session.execute_and_materialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CompiledFlatQuery;
    use crate::result::FlatResultSet;
    use std::cell::RefCell;

    // Records the order of calls instead of executing anything.
    struct RecordingEngine {
        calls: RefCell<Vec<String>>,
    }

    struct RecordingSession<'a> {
        engine: &'a RecordingEngine,
    }

    impl EngineSession for RecordingSession<'_> {
        fn apply_filter(&mut self, predicate: &str) -> Result<(), EngineError> {
            self.engine.calls.borrow_mut().push(format!("filter:{predicate}"));
            Ok(())
        }

        fn apply_sort(&mut self, keys: &str) -> Result<(), EngineError> {
            self.engine.calls.borrow_mut().push(format!("sort:{keys}"));
            Ok(())
        }

        fn apply_limit(&mut self, limit: u32) -> Result<(), EngineError> {
            self.engine.calls.borrow_mut().push(format!("limit:{limit}"));
            Ok(())
        }

        fn apply_projection(&mut self, _spec: ProjectionSpec<'_>) -> Result<(), EngineError> {
            self.engine.calls.borrow_mut().push("projection".into());
            Ok(())
        }

        fn execute_and_materialize(self: Box<Self>) -> Result<ResultSet, EngineError> {
            self.engine.calls.borrow_mut().push("materialize".into());
            Ok(ResultSet::Flat(FlatResultSet::new(Vec::new())))
        }

        fn explain(&self) -> String {
            "recording".into()
        }
    }

    impl RelationalEngine for RecordingEngine {
        fn open(&self, source: &str) -> Result<Box<dyn EngineSession + '_>, EngineError> {
            self.calls.borrow_mut().push(format!("open:{source}"));
            Ok(Box::new(RecordingSession { engine: self }))
        }
    }

    #[test]
    fn test_execute_on_call_order() {
        let query = CompiledQuery::Flat(CompiledFlatQuery {
            source: "Order".into(),
            ops: vec![
                EngineOp::Filter("total > 10".into()),
                EngineOp::Sort("total desc".into()),
                EngineOp::Limit(3),
            ],
            joins: Vec::new(),
            projection: FlatProjection { fields: Vec::new() },
        });

        let engine = RecordingEngine {
            calls: RefCell::new(Vec::new()),
        };
        query.execute_on(&engine).unwrap();

        assert_eq!(
            engine.calls.into_inner(),
            vec![
                "open:Order",
                "filter:total > 10",
                "sort:total desc",
                "limit:3",
                "projection",
                "materialize",
            ]
        );
    }
}
