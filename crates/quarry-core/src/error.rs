//! Request-level error types.

use thiserror::Error;

/// Errors reported while building the catalog, parsing selections, or
/// compiling queries.
///
/// All variants except [`UnresolvableJoin`](Error::UnresolvableJoin) and
/// [`InvalidModel`](Error::InvalidModel) are request-level: they describe a
/// malformed request and are reported to the caller without retry.
/// `InvalidModel` is fatal at catalog build time. `UnresolvableJoin` is an
/// internal invariant violation while anchoring a collection join; it
/// indicates a compiler bug, never a bad request.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Entity name not present in the catalog.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// A path segment failed to resolve, or a non-final segment was not a
    /// relation.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path spec as supplied by the caller.
        path: String,
        /// Why it failed to resolve.
        reason: String,
    },

    /// Requested expansion depth outside the accepted range.
    #[error("invalid depth {0}: expected a value between 1 and 10")]
    InvalidDepth(usize),

    /// No scalar field survived expansion of the selection.
    #[error("selection resolved to no scalar fields")]
    EmptySelection,

    /// Filter or sort text failed validation.
    #[error("invalid clause: {0}")]
    InvalidClause(String),

    /// A request argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Join anchor resolution failed while flattening. Always a bug.
    #[error("unresolvable join at '{0}'")]
    UnresolvableJoin(String),

    /// The domain model failed catalog build validation.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::UnknownEntity("Order".into()).to_string(),
            "unknown entity: Order"
        );
        assert_eq!(
            Error::InvalidPath {
                path: "orders.sku".into(),
                reason: "unknown field 'sku' on entity Order".into(),
            }
            .to_string(),
            "invalid path 'orders.sku': unknown field 'sku' on entity Order"
        );
        assert_eq!(
            Error::InvalidDepth(0).to_string(),
            "invalid depth 0: expected a value between 1 and 10"
        );
        assert_eq!(
            Error::InvalidClause("contains ';'".into()).to_string(),
            "invalid clause: contains ';'"
        );
    }
}
