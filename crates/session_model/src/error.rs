use thiserror::Error;

/// Failure of a gateway call, as seen by the orchestrator.
///
/// Normalization failures never appear here: malformed data is absorbed
/// into defaults by [`crate::SessionSnapshot::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Transport failure or non-success HTTP status.
    #[error("{}", describe_network(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// A readiness or completion poll exceeded its bound.
    #[error("timed out waiting for {waiting_for} after {attempts} attempts")]
    SessionTimeout { waiting_for: String, attempts: u32 },

    /// The compute session reported `status: error`.
    #[error("compute session failed: {0}")]
    ComputeSession(String),

    /// Response body (or an encoded field inside it) could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request was cancelled")]
    Cancelled,
}

impl GatewayError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Errors after which no further execution in the same batch can succeed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SessionTimeout { .. } | Self::ComputeSession(_) | Self::Cancelled
        )
    }
}

fn describe_network(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {message}"),
        None => format!("network error: {message}"),
    }
}
