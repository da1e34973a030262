//! Request and reply shapes of the hosted converse call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseRequest {
    /// User text, exactly as typed.
    pub input: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// The parts of a converse response the console shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverseReply {
    pub conversation_id: Option<String>,
    /// Tool ids the host reports having called, in call order.
    pub tool_calls: Vec<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawConverseResponse {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    steps: Vec<Value>,
    #[serde(default)]
    response: Option<RawResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct RawResponseMessage {
    #[serde(default)]
    message: Option<String>,
}

impl From<RawConverseResponse> for ConverseReply {
    fn from(raw: RawConverseResponse) -> Self {
        let tool_calls = raw
            .steps
            .iter()
            .filter(|step| step.get("type").and_then(Value::as_str) == Some("tool_call"))
            .filter_map(|step| step.get("tool_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        Self {
            conversation_id: raw.conversation_id,
            tool_calls,
            message: raw.response.and_then(|r| r.message).unwrap_or_default(),
        }
    }
}
