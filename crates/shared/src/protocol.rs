use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body of the history endpoints. Only `data[0]` holds records,
/// newest first; later elements may be anything (result-set headers and
/// the like).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPages {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ApiPages {
    /// A first element that is not an array counts as an empty page.
    pub fn into_first_page(self) -> Vec<Value> {
        match self.data.into_iter().next() {
            Some(Value::Array(records)) => records,
            _ => Vec::new(),
        }
    }
}

/// Frames the viewer sends on the raw WebSocket transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Ping,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
