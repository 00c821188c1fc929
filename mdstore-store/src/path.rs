//! Dotted path lookup into enveloped responses.

use serde_json::Value;

/// Follows a dotted path (`outer.inner.items`) through nested objects.
/// Numeric segments index into arrays. An empty path returns `value`.
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
