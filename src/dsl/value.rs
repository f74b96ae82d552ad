//! Literal values of the filter language.

use regex::{Regex, RegexBuilder};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// A literal written in a filter string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quoted string: `"cat"` or `'cat'`
    Str(String),
    /// Number: `3`, `-1.5`, `.5`
    Num(f64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
    /// Array: `[1, "a", [true]]`
    List(Vec<Value>),
    /// Regex literal: `/^ab+/i`
    Regex(RegexLiteral),
}

impl Value {
    /// Text that a full-text node searches for, if this kind of literal is searchable.
    pub fn search_term(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Str(s) => Some(Cow::Borrowed(s)),
            Value::Num(n) => Some(Cow::Owned(render_number(*n))),
            Value::Bool(_) | Value::Null | Value::List(_) | Value::Regex(_) => None,
        }
    }

    /// Strict equality against a value taken from an input record.
    ///
    /// Kinds must match; numbers compare by value, lists element-wise in order.
    pub fn strict_eq(&self, other: &JsonValue) -> bool {
        match (self, other) {
            (Value::Str(a), JsonValue::String(b)) => a == b,
            (Value::Num(a), JsonValue::Number(b)) => b.as_f64() == Some(*a),
            (Value::Bool(a), JsonValue::Bool(b)) => a == b,
            (Value::Null, JsonValue::Null) => true,
            (Value::List(a), JsonValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            _ => false,
        }
    }

    /// Order `other` (the record side) relative to this literal.
    ///
    /// Only number/number and string/string pairs are ordered.
    pub fn order_of(&self, other: &JsonValue) -> Option<Ordering> {
        match (other, self) {
            (JsonValue::Number(a), Value::Num(b)) => a.as_f64()?.partial_cmp(b),
            (JsonValue::String(a), Value::Str(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Num(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Regex(re) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "regex")?;
                map.serialize_entry("pattern", re.pattern())?;
                map.serialize_entry("flags", re.flags())?;
                map.end()
            }
        }
    }
}

/// Shortest decimal rendering of a number: `3`, `1.5`, `-0.25`.
pub fn render_number(n: f64) -> String {
    n.to_string()
}

/// A `/pattern/flags` literal.
///
/// The pattern compiles on first use and the outcome is cached, including failure.
#[derive(Clone)]
pub struct RegexLiteral {
    pattern: String,
    flags: String,
    compiled: OnceLock<Option<Regex>>,
}

impl RegexLiteral {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            flags: flags.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Test `haystack` against the pattern. An unusable pattern matches nothing.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(haystack))
    }

    fn regex(&self) -> Option<&Regex> {
        self.compiled.get_or_init(|| self.compile()).as_ref()
    }

    fn compile(&self) -> Option<Regex> {
        let mut builder = RegexBuilder::new(&self.pattern);
        for flag in self.flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'u' => builder.unicode(true),
                other => {
                    tracing::debug!(
                        "Regex /{}/{}: unsupported flag '{}', literal matches nothing",
                        self.pattern,
                        self.flags,
                        other
                    );
                    return None;
                }
            };
        }

        match builder.build() {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::debug!(
                    "Regex /{}/{}: {}, literal matches nothing",
                    self.pattern,
                    self.flags,
                    err
                );
                None
            }
        }
    }
}

impl PartialEq for RegexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.flags == other.flags
    }
}

impl fmt::Debug for RegexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexLiteral")
            .field("pattern", &self.pattern)
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for RegexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}
