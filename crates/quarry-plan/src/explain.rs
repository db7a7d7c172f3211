//! Human-readable rendering of compiled queries.
//!
//! The output is for diagnostics and logs only; nothing parses it, so the
//! format can change between releases.

use crate::query::{CompiledFlatQuery, CompiledGraphQuery, CompiledQuery, EngineOp};

/// Render a compiled query as a human-readable plan.
pub fn plan_text(query: &CompiledQuery) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Query Plan for {}", query.source()));
    lines.push("=".repeat(40));
    lines.push(format!("Shape: {}", query.shape_name()));

    push_ops(&mut lines, query.ops());

    match query {
        CompiledQuery::Graph(q) => push_graph(&mut lines, q),
        CompiledQuery::Flat(q) => push_flat(&mut lines, q),
    }

    lines.join("\n")
}

fn push_ops(lines: &mut Vec<String>, ops: &[EngineOp]) {
    if ops.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Clauses:".to_string());
    for (i, op) in ops.iter().enumerate() {
        let desc = match op {
            EngineOp::Filter(predicate) => format!("filter {}", predicate),
            EngineOp::Sort(keys) => format!("sort {}", keys),
            EngineOp::Limit(limit) => format!("limit {}", limit),
        };
        lines.push(format!("  {}. {}", i + 1, desc));
    }
}

fn push_graph(lines: &mut Vec<String>, query: &CompiledGraphQuery) {
    if !query.includes.is_empty() {
        lines.push(String::new());
        lines.push("Includes:".to_string());
        for include in &query.includes {
            lines.push(format!(
                "  - {} -> {} ({:?}, depth: {})",
                include.path,
                include.entity,
                include.cardinality,
                include.depth()
            ));
        }
    }

    lines.push(String::new());
    lines.push("Projection:".to_string());
    lines.push(format!(
        "  {}: {}",
        query.projection.entity,
        query.projection.fields.join(", ")
    ));
    for group in &query.projection.groups {
        lines.push(format!(
            "  {} -> {} ({:?}): {}",
            group.path,
            group.entity,
            group.cardinality,
            group.fields.join(", ")
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Distinct: {}",
        if query.distinct { "yes" } else { "no" }
    ));
}

fn push_flat(lines: &mut Vec<String>, query: &CompiledFlatQuery) {
    if !query.joins.is_empty() {
        lines.push(String::new());
        lines.push("Join Steps:".to_string());
        for join in &query.joins {
            let via = if join.via.is_empty() {
                String::new()
            } else {
                format!(", via: {}", join.via.join("."))
            };
            lines.push(format!(
                "  {}. {} -> {} (path: {}, outer hops: {}{})",
                join.level + 1,
                join.source_entity,
                join.target_entity,
                join.path,
                join.outer_hops,
                via
            ));
        }
    }

    lines.push(String::new());
    lines.push("Projection:".to_string());
    for field in &query.projection.fields {
        let anchor = field.accessor.boundary.as_deref().unwrap_or("root");
        lines.push(format!(
            "  - {} <- {} . {}",
            field.alias,
            anchor,
            field.accessor.segments.join(".")
        ));
    }

    lines.push(String::new());
    lines.push("Distinct: yes".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        Cardinality, CompiledFlatQuery, CompiledGraphQuery, FlatAccessor, FlatField,
        FlatJoinStep, FlatProjection, GraphProjection, IncludePath, ProjectionGroup,
    };

    #[test]
    fn test_graph_plan_text() {
        let query = CompiledQuery::Graph(CompiledGraphQuery {
            source: "Order".into(),
            ops: vec![
                EngineOp::Filter("total > 10".into()),
                EngineOp::Limit(5),
            ],
            includes: vec![IncludePath::new("customer", "Customer", Cardinality::ToOne)],
            projection: GraphProjection::new("Order")
                .with_field("id")
                .with_group(
                    ProjectionGroup::new("customer", "Customer", Cardinality::ToOne)
                        .with_field("name"),
                ),
            distinct: true,
        });

        let text = plan_text(&query);
        assert!(text.contains("Query Plan for Order"));
        assert!(text.contains("Shape: graph-preserving"));
        assert!(text.contains("1. filter total > 10"));
        assert!(text.contains("2. limit 5"));
        assert!(text.contains("customer -> Customer (ToOne, depth: 1)"));
        assert!(text.contains("Distinct: yes"));
    }

    #[test]
    fn test_flat_plan_text() {
        let query = CompiledQuery::Flat(CompiledFlatQuery {
            source: "Order".into(),
            ops: Vec::new(),
            joins: vec![FlatJoinStep {
                path: "lines".into(),
                relation: "lines".into(),
                source_entity: "Order".into(),
                target_entity: "OrderLine".into(),
                level: 0,
                common_ancestor_depth: 0,
                outer_hops: 0,
                via: Vec::new(),
            }],
            projection: FlatProjection {
                fields: vec![FlatField {
                    accessor: FlatAccessor {
                        outer_hops: 0,
                        boundary: Some("lines".into()),
                        segments: vec!["sku".into()],
                    },
                    alias: "lines_sku".into(),
                }],
            },
        });

        let text = plan_text(&query);
        assert!(text.contains("Shape: flattening"));
        assert!(text.contains("Join Steps:"));
        assert!(text.contains("1. Order -> OrderLine (path: lines, outer hops: 0)"));
        assert!(text.contains("lines_sku <- lines . sku"));
        assert!(!text.contains("Clauses:"));
    }
}
