//! Typed field extraction from request bodies.

use courier_proto::Body;
use serde_json::Value;

use super::errors::MethodError;

/// Returns the string field `name`, failing when absent or not a string.
pub(crate) fn require_str<'a>(body: &'a Body, name: &str) -> Result<&'a str, MethodError> {
    match body.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "field '{name}' must be a string"
        ))),
        None => Err(missing(name)),
    }
}

/// Like [`require_str`] but also rejects blank values.
pub(crate) fn require_non_empty<'a>(body: &'a Body, name: &str) -> Result<&'a str, MethodError> {
    let value = require_str(body, name)?;
    if value.trim().is_empty() {
        return Err(MethodError::invalid_arguments(format!(
            "field '{name}' must not be empty"
        )));
    }
    Ok(value)
}

/// Returns the optional string field `name`.
pub(crate) fn optional_str<'a>(body: &'a Body, name: &str) -> Result<Option<&'a str>, MethodError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "field '{name}' must be a string"
        ))),
    }
}

/// Returns the strictly positive integer field `name`.
pub(crate) fn require_positive(body: &Body, name: &str) -> Result<u64, MethodError> {
    let value = body.get(name).ok_or_else(|| missing(name))?;
    match value.as_u64() {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(MethodError::invalid_arguments(format!(
            "field '{name}' must be a positive integer"
        ))),
    }
}

fn missing(name: &str) -> MethodError {
    MethodError::invalid_arguments(format!("missing required field '{name}'"))
}
