//! Dotted field paths into nested records.

use serde_json::Value as JsonValue;

/// Walk `path` (`"a.b.c"`) through nested objects.
///
/// Returns `None` as soon as a segment is missing or the current value is not an object.
/// Array indices are not supported.
pub fn resolve<'a>(input: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(input, |current, segment| current.as_object()?.get(segment))
}
