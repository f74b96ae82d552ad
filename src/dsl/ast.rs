//! AST types for the filter DSL.

use serde::{Serialize, Serializer};
use std::fmt;

use super::value::Value;

/// One node of a parsed filter.
///
/// Serializes as `{"type": "logical" | "text" | "comparison", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    /// Terms joined by a single operator: `a=1 and b=2 and c=3`
    Logical {
        #[serde(rename = "operator")]
        op: LogicalOp,
        terms: Vec<AstNode>,
    },

    /// Full-text match: `"cat"`, `/^ca+t$/i`
    Text { value: Value },

    /// Field comparison: `owner.age>=3`
    Comparison {
        field: String,
        #[serde(rename = "operator")]
        op: CompareOp,
        value: Value,
    },
}

/// Operator of a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

/// Field comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,          // =
    Ne,          // !=
    Gt,          // >
    Lt,          // <
    Ge,          // >=
    Le,          // <=
    In,          // in
    NotIn,       // !in
    ContainsAny, // contains_any
    ContainsAll, // contains_all
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Ge => write!(f, ">="),
            CompareOp::Le => write!(f, "<="),
            CompareOp::In => write!(f, "in"),
            CompareOp::NotIn => write!(f, "!in"),
            CompareOp::ContainsAny => write!(f, "contains_any"),
            CompareOp::ContainsAll => write!(f, "contains_all"),
        }
    }
}

impl Serialize for CompareOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl AstNode {
    /// An expression with no terms. Evaluates to true.
    pub fn empty() -> Self {
        AstNode::Logical {
            op: LogicalOp::And,
            terms: Vec::new(),
        }
    }

    /// An OR with no terms. Evaluates to false.
    pub fn unmatchable() -> Self {
        AstNode::Logical {
            op: LogicalOp::Or,
            terms: Vec::new(),
        }
    }

    /// Number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        match self {
            AstNode::Logical { terms, .. } => 1 + terms.iter().map(AstNode::node_count).sum::<usize>(),
            AstNode::Text { .. } | AstNode::Comparison { .. } => 1,
        }
    }
}
