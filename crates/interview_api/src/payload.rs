use serde::{Deserialize, Serialize};
use serde_json::Value;
use session_model::{
    environment_id_from_value, messages_from_value, LiveCodingView, Phase, SessionView, TurnReply,
};

use crate::error::InterviewApiError;

/// Body of `POST /sessions/{id}/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    pub current_code: String,
}

impl MessageRequest {
    pub fn new(message: impl Into<String>, current_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            current_code: current_code.into(),
        }
    }
}

/// Reads a `GET /sessions/{id}` body.
///
/// `session_info` is `init_info` when present, otherwise the whole body.
/// An unknown phase string reads as `None`.
pub fn session_view_from_value(body: &Value) -> SessionView {
    let live_coding = body.get("live_coding");
    let live_coding = LiveCodingView {
        code: live_coding
            .and_then(|block| block.pointer("/code_state/code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        initial_code: live_coding
            .and_then(|block| block.pointer("/current_challenge/initial_code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        environment_id: live_coding
            .and_then(|block| block.pointer("/environment/id"))
            .and_then(environment_id_from_value),
    };

    SessionView {
        phase: phase_from_body(body),
        session_info: Some(body.get("init_info").cloned().unwrap_or_else(|| body.clone())),
        display_messages: body
            .get("display_messages")
            .map(messages_from_value)
            .unwrap_or_default(),
        live_coding,
    }
}

/// Reads a start-action or message reply. Missing content reads as empty.
pub fn turn_reply_from_value(body: &Value) -> TurnReply {
    TurnReply {
        content: body
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        phase: phase_from_body(body),
        phase_changed: body
            .get("phase_changed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

pub fn session_id_from_value(body: &Value) -> Result<String, InterviewApiError> {
    ["session_id", "_id"]
        .into_iter()
        .filter_map(|key| body.get(key))
        .find_map(environment_id_from_value)
        .ok_or(InterviewApiError::MissingSessionId)
}

fn phase_from_body(body: &Value) -> Option<Phase> {
    body.get("phase").and_then(Value::as_str).and_then(Phase::parse)
}
