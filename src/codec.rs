//! Shared helpers for the JSON tree codecs.
//!
//! Both engines map their nodes onto a `serde_json::Value` tree. Parsing
//! disables serde_json's nesting limit because a long key produces one nested
//! object per symbol.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, TrieError};

/// Parse a whole JSON document into a value tree.
pub(crate) fn parse(bytes: &[u8]) -> Result<Value> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

pub(crate) fn render(value: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// JSON type name for error messages.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        TrieError::malformed(path, format!("expected object, found {}", kind(value)))
    })
}

/// Required field of a node record.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, name: &str, path: &str) -> Result<&'a Value> {
    obj.get(name)
        .ok_or_else(|| TrieError::malformed(format!("{path}.{name}"), "missing field"))
}

pub(crate) fn bool_field(obj: &Map<String, Value>, name: &str, path: &str) -> Result<bool> {
    let value = field(obj, name, path)?;
    value.as_bool().ok_or_else(|| {
        TrieError::malformed(
            format!("{path}.{name}"),
            format!("expected boolean, found {}", kind(value)),
        )
    })
}

pub(crate) fn str_field<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    path: &str,
) -> Result<&'a str> {
    let value = field(obj, name, path)?;
    value.as_str().ok_or_else(|| {
        TrieError::malformed(
            format!("{path}.{name}"),
            format!("expected string, found {}", kind(value)),
        )
    })
}

pub(crate) fn object_field<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    path: &str,
) -> Result<&'a Map<String, Value>> {
    as_object(field(obj, name, path)?, &format!("{path}.{name}"))
}
