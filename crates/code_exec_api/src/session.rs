use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use session_model::{
    sleep_or_cancel, CancelSignal, CodeExecutor, ExecutionRequest, GatewayError, RunOutcome,
};

use crate::config::CodeExecConfig;
use crate::direct::outcome_from_value;
use crate::error::CodeExecError;
use crate::http::ExecHttp;

const SESSIONS: &str = "sessions";
const DEFAULT_SESSION_ERROR: &str = "Session creation failed";

#[derive(Debug, Serialize)]
struct SessionExecuteBody<'a> {
    code: &'a str,
    stdin: &'a str,
    filename: &'a str,
}

/// Executes inside a compute session that is created on first use and
/// reused per environment until it fails.
#[derive(Debug)]
pub struct SessionExecutor {
    http: ExecHttp,
    config: CodeExecConfig,
    sessions: Mutex<HashMap<String, String>>,
}

impl SessionExecutor {
    pub fn new(config: CodeExecConfig) -> Result<Self, CodeExecError> {
        Ok(Self {
            http: ExecHttp::new(&config)?,
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Compute session currently cached for `environment`.
    pub fn cached_session(&self, environment: &str) -> Option<String> {
        self.lock_sessions().get(environment).cloned()
    }

    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, CodeExecError> {
        let environment = self
            .config
            .environment_for(request.environment_id.as_deref());
        let session_id = self.ensure_ready(&environment, cancel).await?;

        let body = SessionExecuteBody {
            code: &request.code,
            stdin: &request.stdin,
            filename: &self.config.filename,
        };
        let response = self
            .http
            .post_json(&[SESSIONS, session_id.as_str(), "execute"], &[], &body, cancel)
            .await?;
        Ok(outcome_from_value(&response))
    }

    async fn ensure_ready(
        &self,
        environment: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<String, CodeExecError> {
        if let Some(session_id) = self.cached_session(environment) {
            return Ok(session_id);
        }

        let created = self
            .http
            .post_json(&[SESSIONS], &[], &json!({ "environment": environment }), cancel)
            .await?;
        let session_id = ["session_id", "_id"]
            .into_iter()
            .find_map(|key| created.get(key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or(CodeExecError::MissingField("session_id"))?;

        self.lock_sessions()
            .insert(environment.to_string(), session_id.clone());

        match self.wait_until_ready(&session_id, cancel).await {
            Ok(()) => Ok(session_id),
            Err(error) => {
                self.lock_sessions().remove(environment);
                Err(error)
            }
        }
    }

    async fn wait_until_ready(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<(), CodeExecError> {
        let attempts = self.config.session_poll_attempts;

        for attempt in 0..attempts {
            let state = self.http.get_json(&[SESSIONS, session_id], &[], cancel).await?;
            match state.get("status").and_then(Value::as_str) {
                Some("ready") => {
                    tracing::debug!(session_id, attempt, "compute session ready");
                    return Ok(());
                }
                Some("error") => {
                    let message = state
                        .get("error")
                        .and_then(Value::as_str)
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or(DEFAULT_SESSION_ERROR);
                    return Err(CodeExecError::ComputeSession(message.to_string()));
                }
                status => {
                    tracing::debug!(session_id, attempt, ?status, "compute session not ready");
                }
            }

            sleep_or_cancel(self.config.session_poll_interval, cancel)
                .await
                .map_err(|_| CodeExecError::Cancelled)?;
        }

        Err(CodeExecError::SessionTimeout {
            waiting_for: format!("compute session {session_id}"),
            attempts,
        })
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CodeExecutor for SessionExecutor {
    async fn run(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, GatewayError> {
        Ok(self.execute(request, cancel).await?)
    }
}
