//! Shared utilities for Google API modules

use serde_json::Value;

/// Extract an array field from a JSON response, returning an empty vec if missing.
///
/// Google APIs return lists under varying field names ("items", "messages", "labels").
pub fn extract_array(response: &Value, field: &str) -> Vec<Value> {
    response
        .get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Required string field of a Google response.
pub fn required_str<'a>(response: &'a Value, field: &str) -> Result<&'a str, super::GoogleError> {
    response
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| super::GoogleError::MissingField(field.to_string()))
}
