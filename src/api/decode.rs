//! The single decoding boundary for backend payloads.
//!
//! Some endpoints answer with a bare value, others wrap it as
//! `{"code": 0, "message": "success", "data": ...}`. Both shapes are accepted
//! here and nowhere else; anything else is a typed error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// Decode a list that may be bare or enveloped.
pub fn decode_list<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => Ok(serde_json::from_value(Value::Array(items))?),
        Value::Object(map) if map.contains_key("data") => match unwrap_envelope(map)? {
            Value::Null => Ok(Vec::new()),
            data @ Value::Array(_) => Ok(serde_json::from_value(data)?),
            other => Err(ApiError::Shape(format!(
                "expected a list in 'data', got {}",
                kind(&other)
            ))),
        },
        other => Err(ApiError::Shape(format!(
            "expected a list or a data envelope, got {}",
            kind(&other)
        ))),
    }
}

/// Decode a single resource that may be bare or enveloped.
pub fn decode_item<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) if is_envelope(&map) => match unwrap_envelope(map)? {
            Value::Null => Err(ApiError::Shape("envelope has no data".to_string())),
            data => Ok(serde_json::from_value(data)?),
        },
        value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(ApiError::Shape(format!(
            "expected an object, got {}",
            kind(&other)
        ))),
    }
}

/// Check an enveloped acknowledgement (create/update/delete counts).
pub fn decode_ack(body: &[u8]) -> Result<(), ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) if is_envelope(&map) => unwrap_envelope(map).map(|_| ()),
        other => Err(ApiError::Shape(format!(
            "expected a response envelope, got {}",
            kind(&other)
        ))),
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("code") && (map.contains_key("data") || map.contains_key("message"))
}

fn unwrap_envelope(mut map: serde_json::Map<String, Value>) -> Result<Value, ApiError> {
    let code = map.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(ApiError::Backend { code, message });
    }
    Ok(map.remove("data").unwrap_or(Value::Null))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
