//! Parsed field tree types.

use std::collections::BTreeSet;

use quarry_plan::Cardinality;

/// One node in a parsed field tree.
///
/// `path` is the dot-joined path from the selection root, in canonical
/// spelling. A `Relation` node with no children is a truncation marker:
/// expansion stopped there because of the depth bound or a repeated entity
/// on the branch. That is a valid tree, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    Scalar {
        name: String,
        path: String,
    },
    Relation {
        name: String,
        path: String,
        cardinality: Cardinality,
        children: Vec<FieldNode>,
    },
}

impl FieldNode {
    pub fn name(&self) -> &str {
        match self {
            FieldNode::Scalar { name, .. } | FieldNode::Relation { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FieldNode::Scalar { path, .. } | FieldNode::Relation { path, .. } => path,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldNode::Relation { .. })
    }

    /// Child nodes. Empty for scalars and for truncated relations.
    pub fn children(&self) -> &[FieldNode] {
        match self {
            FieldNode::Scalar { .. } => &[],
            FieldNode::Relation { children, .. } => children,
        }
    }
}

/// A validated field tree for one root entity.
///
/// Produced by [`FieldTreeParser`](crate::fieldtree::FieldTreeParser) and
/// consumed by a compiler within the same request. `actual_depth` is the
/// deepest relation nesting observed in the parsed forest, which may be
/// smaller than the `max_depth` the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    root_entity: String,
    fields: Vec<FieldNode>,
    max_depth: usize,
    actual_depth: usize,
}

impl FieldSelection {
    pub(crate) fn new(root_entity: String, fields: Vec<FieldNode>, max_depth: usize) -> Self {
        fn walk(node: &FieldNode, depth: usize) -> usize {
            node.children()
                .iter()
                .map(|child| walk(child, depth + 1))
                .max()
                .unwrap_or(depth)
        }
        let actual_depth = fields.iter().map(|f| walk(f, 0)).max().unwrap_or(0);
        Self {
            root_entity,
            fields,
            max_depth,
            actual_depth,
        }
    }

    /// Canonical name of the root entity.
    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    /// Root nodes of the forest, in the order the path specs were given.
    pub fn fields(&self) -> &[FieldNode] {
        &self.fields
    }

    /// The depth bound this selection was parsed under.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Maximum relation-ancestor count observed across all nodes.
    pub fn actual_depth(&self) -> usize {
        self.actual_depth
    }

    /// Dotted paths of every leaf: scalar nodes plus relation nodes whose
    /// expansion was truncated. Sorted and deduplicated.
    pub fn leaf_paths(&self) -> BTreeSet<String> {
        fn collect(node: &FieldNode, out: &mut BTreeSet<String>) {
            if node.children().is_empty() {
                out.insert(node.path().to_string());
            } else {
                for child in node.children() {
                    collect(child, out);
                }
            }
        }
        let mut out = BTreeSet::new();
        for field in &self.fields {
            collect(field, &mut out);
        }
        out
    }
}
