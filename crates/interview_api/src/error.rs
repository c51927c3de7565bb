use reqwest::StatusCode;
use serde_json::Value;
use session_model::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterviewApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0} {1}")]
    Status(StatusCode, String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("create-session response carried no session id")]
    MissingSessionId,

    #[error("request was cancelled")]
    Cancelled,
}

impl From<InterviewApiError> for GatewayError {
    fn from(error: InterviewApiError) -> Self {
        match error {
            InterviewApiError::Status(status, message) => {
                GatewayError::status(status.as_u16(), message)
            }
            InterviewApiError::Serde(error) => GatewayError::Decode(error.to_string()),
            InterviewApiError::MissingSessionId => {
                GatewayError::Decode(InterviewApiError::MissingSessionId.to_string())
            }
            InterviewApiError::Cancelled => GatewayError::Cancelled,
            other => GatewayError::network(other.to_string()),
        }
    }
}

/// Extracts a human-readable message from a non-success response body.
///
/// Understands `{"detail": ...}`, `{"error": {"message": ...}}`,
/// `{"error": "..."}` and `{"message": ...}`; otherwise returns the raw
/// body, or the status reason for an empty body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = message_from_error_body(&parsed) {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn message_from_error_body(body: &Value) -> Option<String> {
    let candidates = [
        body.get("detail"),
        body.get("error").and_then(|error| error.get("message")),
        body.get("error"),
        body.get("message"),
    ];

    candidates.into_iter().flatten().find_map(|value| match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(_) => Some(value.to_string()),
        _ => None,
    })
}
