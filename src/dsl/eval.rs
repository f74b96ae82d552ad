//! Evaluator for the filter DSL AST.

use serde_json::Value as JsonValue;
use std::borrow::Cow;

use super::ast::{AstNode, CompareOp, LogicalOp};
use super::field::resolve;
use super::value::{Value, render_number};
use crate::synonyms::SynonymTable;

static NULL: JsonValue = JsonValue::Null;

/// What a filter is checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Subject<'a> {
    /// Plain text, matched by full-text nodes.
    Text(&'a str),
    /// Structured record, matched by field comparisons.
    Record(&'a JsonValue),
}

impl<'a> From<&'a str> for Subject<'a> {
    fn from(text: &'a str) -> Self {
        Subject::Text(text)
    }
}

impl<'a> From<&'a String> for Subject<'a> {
    fn from(text: &'a String) -> Self {
        Subject::Text(text)
    }
}

/// A JSON string is text; any other JSON value is a record.
impl<'a> From<&'a JsonValue> for Subject<'a> {
    fn from(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::String(text) => Subject::Text(text),
            other => Subject::Record(other),
        }
    }
}

/// Evaluate a filter AST against a subject.
pub fn evaluate_filter(ast: &AstNode, subject: Subject<'_>, synonyms: &SynonymTable) -> bool {
    match ast {
        AstNode::Logical {
            op: LogicalOp::And,
            terms,
        } => terms.iter().all(|t| evaluate_filter(t, subject, synonyms)),

        AstNode::Logical {
            op: LogicalOp::Or,
            terms,
        } => terms.iter().any(|t| evaluate_filter(t, subject, synonyms)),

        AstNode::Text { value } => match subject {
            Subject::Text(text) => match_text(value, text, synonyms),
            Subject::Record(_) => false,
        },

        AstNode::Comparison { field, op, value } => {
            let actual = match subject {
                Subject::Record(record) => resolve(record, field).unwrap_or(&NULL),
                Subject::Text(_) => &NULL,
            };
            compare(*op, actual, value)
        }
    }
}

/// Full-text match: a regex, or a case-insensitive substring search for the value and
/// each of its synonyms.
fn match_text(value: &Value, text: &str, synonyms: &SynonymTable) -> bool {
    if let Value::Regex(re) = value {
        return re.is_match(text);
    }

    let Some(term) = value.search_term() else {
        return false;
    };

    let haystack = text.to_lowercase();
    std::iter::once(&*term)
        .chain(synonyms.lookup(&term).iter().map(String::as_str))
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// Apply a comparison operator to a record value and a literal.
fn compare(op: CompareOp, actual: &JsonValue, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => equals(actual, expected),
        CompareOp::Ne => !equals(actual, expected),
        CompareOp::Gt => expected.order_of(actual).is_some_and(|o| o.is_gt()),
        CompareOp::Lt => expected.order_of(actual).is_some_and(|o| o.is_lt()),
        CompareOp::Ge => expected.order_of(actual).is_some_and(|o| o.is_ge()),
        CompareOp::Le => expected.order_of(actual).is_some_and(|o| o.is_le()),
        CompareOp::In => member_of(actual, expected),
        CompareOp::NotIn => !member_of(actual, expected),
        CompareOp::ContainsAny => match (actual, expected) {
            (JsonValue::Array(have), Value::List(wanted)) => {
                wanted.iter().any(|w| have.iter().any(|h| w.strict_eq(h)))
            }
            _ => false,
        },
        CompareOp::ContainsAll => match (actual, expected) {
            (JsonValue::Array(have), Value::List(wanted)) => {
                wanted.iter().all(|w| have.iter().any(|h| w.strict_eq(h)))
            }
            _ => false,
        },
    }
}

fn equals(actual: &JsonValue, expected: &Value) -> bool {
    match expected {
        Value::Regex(re) => field_text(actual).is_some_and(|text| re.is_match(&text)),
        other => other.strict_eq(actual),
    }
}

fn member_of(actual: &JsonValue, expected: &Value) -> bool {
    match expected {
        Value::List(items) => items.iter().any(|item| item.strict_eq(actual)),
        _ => false,
    }
}

/// Render a scalar record value for regex matching. Lists and objects have no text.
fn field_text(value: &JsonValue) -> Option<Cow<'_, str>> {
    match value {
        JsonValue::String(s) => Some(Cow::Borrowed(s)),
        JsonValue::Number(n) => Some(Cow::Owned(match n.as_f64() {
            Some(f) if n.is_f64() => render_number(f),
            _ => n.to_string(),
        })),
        JsonValue::Bool(true) => Some(Cow::Borrowed("1")),
        JsonValue::Bool(false) | JsonValue::Null => Some(Cow::Borrowed("")),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
