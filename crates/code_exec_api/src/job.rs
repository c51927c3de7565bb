use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::Value;
use session_model::{
    seconds_from_value, sleep_or_cancel, CancelSignal, CodeExecutor, ExecutionRequest,
    GatewayError, RunOutcome,
};

use crate::config::CodeExecConfig;
use crate::error::CodeExecError;
use crate::http::ExecHttp;

const SUBMISSIONS: &str = "submissions";
const PENDING_STATES: [&str; 2] = ["In Queue", "Processing"];

#[derive(Debug, Serialize)]
struct SubmissionBody {
    source_code: String,
    language_id: u32,
    stdin: String,
}

/// Submits a job and polls its token until the service finishes it.
#[derive(Debug)]
pub struct JobTokenExecutor {
    http: ExecHttp,
    config: CodeExecConfig,
}

impl JobTokenExecutor {
    pub fn new(config: CodeExecConfig) -> Result<Self, CodeExecError> {
        Ok(Self {
            http: ExecHttp::new(&config)?,
            config,
        })
    }

    pub fn language_id_for(&self, environment_id: Option<&str>) -> u32 {
        environment_id
            .and_then(|id| id.trim().parse::<u32>().ok())
            .unwrap_or(self.config.default_language_id)
    }

    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, CodeExecError> {
        let token = self.submit(request, cancel).await?;
        let result = self.poll(&token, cancel).await?;
        outcome_from_submission(&result)
    }

    async fn submit(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<String, CodeExecError> {
        let body = SubmissionBody {
            source_code: general_purpose::STANDARD.encode(&request.code),
            language_id: self.language_id_for(request.environment_id.as_deref()),
            stdin: general_purpose::STANDARD.encode(&request.stdin),
        };
        let response = self
            .http
            .post_json(
                &[SUBMISSIONS],
                &[("base64_encoded", "true"), ("wait", "false")],
                &body,
                cancel,
            )
            .await?;

        response
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.trim().is_empty())
            .map(str::to_string)
            .ok_or(CodeExecError::MissingField("token"))
    }

    async fn poll(&self, token: &str, cancel: Option<&CancelSignal>) -> Result<Value, CodeExecError> {
        let attempts = self.config.job_poll_attempts;

        for attempt in 0..attempts {
            let result = self
                .http
                .get_json(&[SUBMISSIONS, token], &[("base64_encoded", "true")], cancel)
                .await?;
            let description = result
                .pointer("/status/description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !PENDING_STATES.contains(&description) {
                return Ok(result);
            }

            tracing::debug!(token, attempt, description, "submission still pending");
            sleep_or_cancel(self.config.job_poll_interval, cancel)
                .await
                .map_err(|_| CodeExecError::Cancelled)?;
        }

        Err(CodeExecError::SessionTimeout {
            waiting_for: format!("submission {token}"),
            attempts,
        })
    }
}

#[async_trait]
impl CodeExecutor for JobTokenExecutor {
    async fn run(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, GatewayError> {
        Ok(self.execute(request, cancel).await?)
    }
}

/// Decodes a finished submission. Empty `stderr` falls back to
/// `compile_output`.
pub(crate) fn outcome_from_submission(result: &Value) -> Result<RunOutcome, CodeExecError> {
    let stdout = decode_field(result, "stdout")?;
    let stderr = decode_field(result, "stderr")?;
    let compile_output = decode_field(result, "compile_output")?;

    Ok(RunOutcome {
        stdout,
        stderr: if stderr.is_empty() { compile_output } else { stderr },
        status: result
            .pointer("/status/description")
            .and_then(Value::as_str)
            .map(str::to_string),
        execution_time: result.get("time").and_then(seconds_from_value),
        exit_code: result.get("exit_code").and_then(Value::as_i64),
    })
}

fn decode_field(result: &Value, field: &'static str) -> Result<String, CodeExecError> {
    let Some(encoded) = result.get(field).and_then(Value::as_str) else {
        return Ok(String::new());
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD
        .decode(compact)
        .map_err(|error| CodeExecError::Decode {
            field,
            reason: error.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
