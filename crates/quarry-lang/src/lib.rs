//! Quarry clause grammar.
//!
//! This crate parses the filter and sort clause text that arrives on query
//! requests. The grammar is deliberately small: predicates over dotted field
//! paths, combined with boolean operators.
//!
//! # Filter Syntax
//!
//! ```text
//! total > 100
//! status == "active" && total >= 100
//! department.name != 'Sales'
//! status in ['open', 'held']
//! manager is not null
//! name not like '%test%'
//! !(a == 1 || b == 2)
//! ```
//!
//! Word keywords (`and`, `or`, `not`, `like`, `in`, `is`, `null`, `asc`,
//! `desc`) are case-insensitive; field names are not.
//!
//! # Sort Syntax
//!
//! ```text
//! name
//! created_at desc, name
//! department.name asc, total desc
//! ```
//!
//! # Usage
//!
//! ```rust
//! use quarry_lang::{parse_filter, parse_sort};
//!
//! let expr = parse_filter(r#"status == "active" && total >= 100"#).unwrap();
//! assert_eq!(expr.field_paths().len(), 2);
//!
//! let keys = parse_sort("created_at desc, name").unwrap();
//! assert_eq!(keys.len(), 2);
//! ```
//!
//! Parse errors carry byte spans and render with source context:
//!
//! ```rust
//! use quarry_lang::parse_filter;
//!
//! let source = "total >";
//! let err = parse_filter(source).unwrap_err();
//! let rendered = err.format_with_source(source);
//! assert!(rendered.contains("line 1"));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export main types
pub use ast::{ClauseExpr, ComparisonOp, FieldPath, Literal, SortDirection, SortKey};
pub use error::ClauseError;
pub use span::Span;

/// Parse filter clause text into an expression.
pub fn parse_filter(source: &str) -> Result<ClauseExpr, ClauseError> {
    parser::parse_filter(source)
}

/// Parse sort clause text into an ordered key list.
pub fn parse_sort(source: &str) -> Result<Vec<SortKey>, ClauseError> {
    parser::parse_sort(source)
}

/// Tokenize clause text (for debugging/testing).
pub fn tokenize(source: &str) -> Vec<lexer::SpannedToken> {
    lexer::tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_end_to_end() {
        let expr =
            parse_filter(r#"(status == "active" || status == "held") && total > 100"#).unwrap();
        let paths: Vec<String> = expr.field_paths().iter().map(|p| p.dotted()).collect();
        assert_eq!(paths, vec!["status", "status", "total"]);
    }

    #[test]
    fn test_parse_sort_end_to_end() {
        let keys = parse_sort("department.name asc, total desc").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].direction, SortDirection::Desc);
    }

    #[test]
    fn test_error_renders_with_context() {
        let source = "total > ";
        let err = parse_filter(source).unwrap_err();
        let rendered = err.format_with_source(source);
        assert!(rendered.contains("error:"));
        assert!(rendered.contains("line 1"));
    }

    #[test]
    fn test_tokenize_exposed_for_debugging() {
        assert!(!tokenize("a == 1").is_empty());
    }
}
