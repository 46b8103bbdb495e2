//! Tool argument decoding
//!
//! Models hand tool arguments over in several shapes: a JSON object, a JSON
//! document encoded as a string, or a string wrapped as `{"input_str": ...}`.
//! Everything is normalized to an object here. Text that is not a JSON object
//! decodes to an empty object, so a tool reports its own missing keys instead
//! of failing on the parse.

use super::ToolError;
use serde_json::{Map, Value};

const WRAPPED_KEY: &str = "input_str";

/// Normalize tool input to a JSON object
pub fn decode_object(input: Value) -> Map<String, Value> {
    match input {
        Value::Object(mut map) => match map.get(WRAPPED_KEY) {
            Some(Value::String(_)) => match map.remove(WRAPPED_KEY) {
                Some(Value::String(text)) => parse_object(&text),
                _ => Map::new(),
            },
            _ => map,
        },
        Value::String(text) => parse_object(&text),
        _ => Map::new(),
    }
}

fn parse_object(text: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Extract a single scalar argument: a bare string, or the first of `keys`
/// holding a string in an object.
pub fn decode_scalar(input: &Value, keys: &[&str]) -> Option<String> {
    match input {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => keys
            .iter()
            .chain(std::iter::once(&WRAPPED_KEY))
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(String::from),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}

/// Null, empty strings and empty containers count as missing
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// Optional string field; missing and empty values are `None`
pub fn opt_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Check that every key in `keys` is present before any remote call is made
pub fn require(args: &Map<String, Value>, keys: &[&str]) -> Result<(), ToolError> {
    if keys
        .iter()
        .all(|k| args.get(*k).is_some_and(is_present))
    {
        return Ok(());
    }

    let quoted: Vec<String> = keys.iter().map(|k| format!("'{k}'")).collect();
    let message = match quoted.as_slice() {
        [only] => format!("Missing required fields: {only} is required."),
        [init @ .., last] => format!(
            "Missing required fields: {}, and {last} are all required.",
            init.join(", ")
        ),
        [] => "Missing required fields.".to_string(),
    };
    Err(ToolError::Validation(message))
}

/// A required field that must be a string
pub fn require_str(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(other) if is_present(other) => Err(ToolError::Validation(format!(
            "Field '{key}' must be a string."
        ))),
        _ => Err(ToolError::Validation(format!(
            "Missing required fields: '{key}' is required."
        ))),
    }
}
