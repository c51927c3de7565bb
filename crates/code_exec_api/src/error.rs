use reqwest::StatusCode;
use serde_json::Value;
use session_model::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeExecError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0} {1}")]
    Status(StatusCode, String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("cannot decode `{field}`: {reason}")]
    Decode { field: &'static str, reason: String },

    #[error("{0}")]
    ComputeSession(String),

    #[error("timed out waiting for {waiting_for} after {attempts} attempts")]
    SessionTimeout { waiting_for: String, attempts: u32 },

    #[error("execution was cancelled")]
    Cancelled,
}

impl From<CodeExecError> for GatewayError {
    fn from(error: CodeExecError) -> Self {
        match error {
            CodeExecError::Status(status, message) => GatewayError::status(status.as_u16(), message),
            CodeExecError::ComputeSession(message) => GatewayError::ComputeSession(message),
            CodeExecError::SessionTimeout {
                waiting_for,
                attempts,
            } => GatewayError::SessionTimeout {
                waiting_for,
                attempts,
            },
            CodeExecError::Cancelled => GatewayError::Cancelled,
            error @ (CodeExecError::Serde(_)
            | CodeExecError::MissingField(_)
            | CodeExecError::Decode { .. }) => GatewayError::Decode(error.to_string()),
            other => GatewayError::network(other.to_string()),
        }
    }
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|body| {
        [
            body.get("detail"),
            body.get("error").and_then(|error| error.get("message")),
            body.get("error"),
            body.get("message"),
        ]
        .into_iter()
        .flatten()
        .find_map(|value| value.as_str().map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.to_string(),
    }
}
