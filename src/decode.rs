//! Tolerant decoding of backend payloads.
//!
//! List endpoints answer either with a bare array or with an object wrapping
//! the array under a known key. Anything else is logged and treated as an
//! empty list so the UI keeps working while the backend evolves.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode `value` as a list of `T`, accepting `[...]` or `{ <key>: [...] }`.
///
/// Items that fail to decode are skipped individually.
pub fn decode_list<T: DeserializeOwned>(value: Value, key: &str) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::error!("Unexpected {} shape: object without a '{}' list", key, key);
                return Vec::new();
            }
        },
        other => {
            tracing::error!("Unexpected {} shape: {}", key, kind(&other));
            return Vec::new();
        }
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("Skipping malformed {} entry: {}", key, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::warn!("Decoded {}/{} {} entries", decoded.len(), total, key);
    }
    decoded
}

/// Deserialize a field, substituting the default when it is null or has the
/// wrong type.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    let shape = kind(&value);
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed {} field: {}", shape, e);
        T::default()
    }))
}

/// Deserialize a list field one entry at a time, dropping the entries that
/// fail to decode instead of the whole list.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let name = std::any::type_name::<T>().rsplit("::").next().unwrap_or("list");
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(decode_list(value, name)),
        other => {
            tracing::warn!("Ignoring {} list sent as {}", name, kind(&other));
            Ok(Vec::new())
        }
    }
}

/// Truthiness of a loosely typed JSON value.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
