use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use session_model::{
    seconds_from_value, CancelSignal, CodeExecutor, ExecutionRequest, GatewayError, RunOutcome,
};

use crate::config::CodeExecConfig;
use crate::error::CodeExecError;
use crate::http::{text_field, ExecHttp};

#[derive(Debug, Serialize)]
struct ExecuteBody<'a> {
    environment: &'a str,
    code: &'a str,
    stdin: &'a str,
    filename: &'a str,
}

/// One `POST execute` per run.
#[derive(Debug)]
pub struct DirectExecutor {
    http: ExecHttp,
    config: CodeExecConfig,
}

impl DirectExecutor {
    pub fn new(config: CodeExecConfig) -> Result<Self, CodeExecError> {
        Ok(Self {
            http: ExecHttp::new(&config)?,
            config,
        })
    }

    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, CodeExecError> {
        let environment = self
            .config
            .environment_for(request.environment_id.as_deref());
        let body = ExecuteBody {
            environment: &environment,
            code: &request.code,
            stdin: &request.stdin,
            filename: &self.config.filename,
        };
        let response = self.http.post_json(&["execute"], &[], &body, cancel).await?;
        Ok(outcome_from_value(&response))
    }
}

#[async_trait]
impl CodeExecutor for DirectExecutor {
    async fn run(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, GatewayError> {
        Ok(self.execute(request, cancel).await?)
    }
}

/// Reads `{stdout, stderr, status, execution_time, exit_code}`.
pub(crate) fn outcome_from_value(body: &Value) -> RunOutcome {
    RunOutcome {
        stdout: text_field(body, "stdout"),
        stderr: text_field(body, "stderr"),
        status: body
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        execution_time: body.get("execution_time").and_then(seconds_from_value),
        exit_code: body.get("exit_code").and_then(Value::as_i64),
    }
}
