use thiserror::Error;

/// Errors reported by a relational engine while executing a compiled query.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("clause error: {0}")]
    Clause(String),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("accessor error: {0}")]
    Accessor(String),

    #[error("backend error: {0}")]
    Backend(String),
}
