use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::phase::Phase;

/// Transcript author. Closed two-value tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-phase transcripts. Every phase always has a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesByPhase {
    pub interview: Vec<Message>,
    pub live_coding: Vec<Message>,
    pub r#final: Vec<Message>,
}

impl MessagesByPhase {
    #[must_use]
    pub fn get(&self, phase: Phase) -> &[Message] {
        match phase {
            Phase::Interview => &self.interview,
            Phase::LiveCoding => &self.live_coding,
            Phase::Final => &self.r#final,
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut Vec<Message> {
        match phase {
            Phase::Interview => &mut self.interview,
            Phase::LiveCoding => &mut self.live_coding,
            Phase::Final => &mut self.r#final,
        }
    }

    pub fn push(&mut self, phase: Phase, message: Message) {
        self.get_mut(phase).push(message);
    }
}

/// Result of the last code execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<String>,
    pub execution_time: Option<f64>,
    pub exit_code: Option<i64>,
}

impl RunOutcome {
    /// Outcome recorded when a run could not reach the execution service.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            status: Some("error".to_string()),
            execution_time: None,
            exit_code: None,
        }
    }
}

/// Complete local representation of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: Phase,
    pub messages_by_phase: MessagesByPhase,
    pub code: String,
    pub environment_id: Option<String>,
    pub run_outcome: Option<RunOutcome>,
    pub session_info: Option<Value>,
}

impl SessionSnapshot {
    /// Default snapshot for a session seen for the first time.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            phase: Phase::default(),
            messages_by_phase: MessagesByPhase::default(),
            code: String::new(),
            environment_id: None,
            run_outcome: None,
            session_info: None,
        }
    }

    #[must_use]
    pub fn messages(&self, phase: Phase) -> &[Message] {
        self.messages_by_phase.get(phase)
    }

    /// Serialized form used for persistence and partial updates.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
