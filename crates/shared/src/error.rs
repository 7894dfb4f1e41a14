use thiserror::Error;

/// An inbound frame that could not be decoded as JSON.
#[derive(Debug, Error)]
#[error("frame is not valid JSON: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

/// A decoded payload that is not a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload is not a record: expected a JSON object, got {found}")]
pub struct ParseError {
    pub found: &'static str,
}

impl ParseError {
    pub fn for_value(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        Self { found }
    }
}
