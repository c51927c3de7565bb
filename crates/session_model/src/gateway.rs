//! Transport-neutral contracts for the two remote services.
//!
//! Every response may report a phase other than the one the caller
//! believed current. Implementations report what the service said; the
//! orchestrator decides what it means.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelSignal;
use crate::error::GatewayError;
use crate::phase::Phase;
use crate::snapshot::{MessagesByPhase, RunOutcome};

/// Seniority levels offered when a session is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Intern,
    Junior,
    #[default]
    Middle,
    Senior,
    Lead,
    Principal,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Intern,
        Level::Junior,
        Level::Middle,
        Level::Senior,
        Level::Lead,
        Level::Principal,
    ];

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intern => "intern",
            Self::Junior => "junior",
            Self::Middle => "middle",
            Self::Senior => "senior",
            Self::Lead => "lead",
            Self::Principal => "principal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form submitted to create a new interview session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub vacancy: String,
    pub stack: String,
    pub level: Level,
    pub language: String,
}

impl NewSession {
    pub const DEFAULT_LANGUAGE: &'static str = "English";

    #[must_use]
    pub fn new(vacancy: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            vacancy: vacancy.into(),
            stack: stack.into(),
            level: Level::default(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Live-coding block of a fetched session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveCodingView {
    /// Latest editor state recorded by the service.
    pub code: Option<String>,
    /// Starter code of the current challenge.
    pub initial_code: Option<String>,
    pub environment_id: Option<String>,
}

impl LiveCodingView {
    /// Code the editor should show: recorded state first, then starter code.
    #[must_use]
    pub fn editor_code(&self) -> Option<&str> {
        self.code.as_deref().or(self.initial_code.as_deref())
    }
}

/// Authoritative view of a session returned by `fetch_session`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    /// `None` when the service reported a phase this client does not know.
    pub phase: Option<Phase>,
    pub session_info: Option<Value>,
    pub display_messages: MessagesByPhase,
    pub live_coding: LiveCodingView,
}

/// Reply to a start action or a posted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReply {
    pub content: String,
    pub phase: Option<Phase>,
    /// The service advanced its phase while handling this call.
    pub phase_changed: bool,
}

/// Input for one code execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub environment_id: Option<String>,
    pub code: String,
    pub stdin: String,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            environment_id: None,
            code: code.into(),
            stdin: String::new(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment_id: Option<String>) -> Self {
        self.environment_id = environment_id;
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }
}

/// Contract with the remote session/chat service.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Creates a session and returns its identifier.
    async fn create_session(&self, request: &NewSession) -> Result<String, GatewayError>;

    async fn fetch_session(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<SessionView, GatewayError>;

    /// Start action for `interview` and `live_coding`.
    ///
    /// Implementations route `Phase::Final` to
    /// [`SessionGateway::start_final_summary`].
    async fn start_phase(
        &self,
        session_id: &str,
        phase: Phase,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError>;

    /// Start action for the final summary. The reply never carries a
    /// phase-changed signal.
    async fn start_final_summary(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError>;

    async fn post_message(
        &self,
        session_id: &str,
        message: &str,
        current_code: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError>;
}

/// Contract with the remote code-execution service.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn run(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, GatewayError>;
}
