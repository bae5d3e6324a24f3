//! Query-string encoding for read- and delete-style calls

use serde_json::Value;
use url::form_urlencoded;

/// Encode a payload as `application/x-www-form-urlencoded` pairs
///
/// Object fields become `key=value`; array fields repeat the key. A top-level
/// array is keyed by index. Nested objects and nulls encode as empty values,
/// and a bare scalar produces no pairs.
pub fn to_query_string(data: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    match data {
        Value::Object(map) => {
            for (key, value) in map {
                append_pair(&mut serializer, key, value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append_pair(&mut serializer, &index.to_string(), value);
            }
        }
        _ => {}
    }

    serializer.finish()
}

/// Append an encoded query to a URL, respecting an existing query part
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn append_pair(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                serializer.append_pair(key, &scalar(item));
            }
        }
        other => {
            serializer.append_pair(key, &scalar(other));
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}
