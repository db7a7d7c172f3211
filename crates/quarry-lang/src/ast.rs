//! Abstract syntax trees for filter and sort clauses.

use crate::span::Span;
use quarry_plan::Value;

/// A dotted field reference, e.g. `total` or `department.name`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    /// Path segments, at least one.
    pub segments: Vec<String>,
    /// Span of the whole path in the clause text.
    pub span: Span,
}

impl FieldPath {
    /// Create a new field path.
    pub fn new(segments: Vec<String>, span: Span) -> Self {
        Self { segments, span }
    }

    /// The path as dotted text.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Whether the path is a bare field with no relation hops.
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseExpr {
    /// Comparison: field op literal.
    Comparison {
        field: FieldPath,
        op: ComparisonOp,
        value: Literal,
    },
    /// LIKE pattern match.
    Like {
        field: FieldPath,
        pattern: String,
        negated: bool,
    },
    /// Membership check: field in [values].
    In {
        field: FieldPath,
        values: Vec<Literal>,
        negated: bool,
    },
    /// NULL check: field is [not] null.
    IsNull { field: FieldPath, negated: bool },
    /// Conjunction of expressions.
    And(Vec<ClauseExpr>),
    /// Disjunction of expressions.
    Or(Vec<ClauseExpr>),
    /// Negation of an expression.
    Not(Box<ClauseExpr>),
}

impl ClauseExpr {
    /// Create an AND of expressions, unwrapping a single expression.
    pub fn and(exprs: Vec<ClauseExpr>) -> Self {
        if exprs.len() == 1 {
            exprs.into_iter().next().unwrap()
        } else {
            ClauseExpr::And(exprs)
        }
    }

    /// Create an OR of expressions, unwrapping a single expression.
    pub fn or(exprs: Vec<ClauseExpr>) -> Self {
        if exprs.len() == 1 {
            exprs.into_iter().next().unwrap()
        } else {
            ClauseExpr::Or(exprs)
        }
    }

    /// All field paths referenced by this expression, outermost first.
    pub fn field_paths(&self) -> Vec<&FieldPath> {
        let mut paths = Vec::new();
        self.collect_field_paths(&mut paths);
        paths
    }

    fn collect_field_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            ClauseExpr::Comparison { field, .. }
            | ClauseExpr::Like { field, .. }
            | ClauseExpr::In { field, .. }
            | ClauseExpr::IsNull { field, .. } => out.push(field),
            ClauseExpr::And(exprs) | ClauseExpr::Or(exprs) => {
                for expr in exprs {
                    expr.collect_field_paths(out);
                }
            }
            ClauseExpr::Not(expr) => expr.collect_field_paths(out),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Equal (==).
    Eq,
    /// Not equal (!=).
    Ne,
    /// Less than (<).
    Lt,
    /// Less than or equal (<=).
    Le,
    /// Greater than (>).
    Gt,
    /// Greater than or equal (>=).
    Ge,
}

impl ComparisonOp {
    /// Whether an ordering between operands satisfies this operator.
    pub fn holds(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            ComparisonOp::Eq => ord == Equal,
            ComparisonOp::Ne => ord != Equal,
            ComparisonOp::Lt => ord == Less,
            ComparisonOp::Le => ord != Greater,
            ComparisonOp::Gt => ord == Greater,
            ComparisonOp::Ge => ord != Less,
        }
    }
}

/// A literal value in clause text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
}

impl Literal {
    /// Get a description of the literal type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
        }
    }

    /// Convert to a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int64(*i),
            Literal::Float(f) => Value::Float64(*f),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// One key of a sort clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// The field path to sort by.
    pub path: FieldPath,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (default when no direction is given).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}
