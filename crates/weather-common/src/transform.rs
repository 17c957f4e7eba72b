//! Payload decoding and projection.

use crate::error::{TransformError, TransformResult};
use crate::observation::WeatherObservation;
use crate::summary::WeatherSummary;

/// Decode raw queue payload bytes into an observation.
///
/// The document root must be a JSON object or `null`. serde would otherwise
/// accept a positional array for a struct with defaulted fields. A `null`
/// root decodes like `{}`, the same as a `null` field.
pub fn decode_observation(payload: &[u8]) -> TransformResult<WeatherObservation> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(TransformError::Decode)?;
    match value {
        serde_json::Value::Null => Ok(WeatherObservation::default()),
        serde_json::Value::Object(_) => {
            serde_json::from_value(value).map_err(TransformError::Decode)
        }
        other => Err(TransformError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Decode a payload and project it into the outbound summary.
pub fn transform(payload: &[u8]) -> TransformResult<WeatherSummary> {
    let observation = decode_observation(payload)?;
    Ok(WeatherSummary::from(&observation))
}
