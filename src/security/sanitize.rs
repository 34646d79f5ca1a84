//! Input and output sanitization.
//!
//! Storage sanitization drops control characters and surrounding
//! whitespace. Display sanitization escapes markup. Both are pure.

use serde_json::Value;

/// Characters removed before storage: NUL, the C0 controls and DEL.
///
/// Tab and newline are removed too, so multi-line messages are flattened.
fn is_stripped(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}')
}

/// Strip control characters and trim surrounding whitespace.
pub fn sanitize_for_storage(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !is_stripped(*c)).collect();
    stripped.trim().to_string()
}

/// [`sanitize_for_storage`] applied to every string inside a JSON value.
pub fn sanitize_value_for_storage(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_for_storage(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value_for_storage).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value_for_storage(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Escape `& < > " '` for embedding in markup or attribute values.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Render any value as escaped text; `null` becomes the empty string.
pub fn sanitize_for_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_html(s),
        Value::Bool(_) | Value::Number(_) => escape_html(&value.to_string()),
        Value::Array(_) | Value::Object(_) => escape_html(&value.to_string()),
    }
}
