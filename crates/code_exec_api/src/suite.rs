use serde::{Deserialize, Serialize};
use session_model::{CancelSignal, CodeExecutor, ExecutionRequest, GatewayError, RunOutcome};

pub const STATUS_ACCEPTED: &str = "Accepted";
pub const STATUS_ERROR: &str = "Error";
pub const STATUS_SESSION_ERROR: &str = "Session Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub input: String,
    pub expected: String,
    /// Trimmed stdout.
    pub actual: String,
    pub stderr: String,
    pub passed: bool,
    pub status: String,
    pub time: Option<f64>,
    pub error: Option<String>,
}

impl TestCaseResult {
    fn from_outcome(case: &TestCase, outcome: RunOutcome) -> Self {
        let actual = outcome.stdout.trim().to_string();
        let status = match outcome.status.as_deref() {
            Some("completed") => STATUS_ACCEPTED.to_string(),
            Some(status) => status.to_string(),
            None => String::new(),
        };
        Self {
            passed: actual == case.expected.trim(),
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual,
            stderr: outcome.stderr.trim().to_string(),
            status,
            time: outcome.execution_time,
            error: None,
        }
    }

    fn failed(input: &str, expected: &str, status: &str, error: &GatewayError) -> Self {
        Self {
            input: input.to_string(),
            expected: expected.to_string(),
            actual: String::new(),
            stderr: String::new(),
            passed: false,
            status: status.to_string(),
            time: None,
            error: Some(error.to_string()),
        }
    }
}

/// Runs `code` once per case, in order.
///
/// A per-case failure is recorded and the suite continues. A terminal
/// failure (readiness, compute session, cancellation) appends a single
/// `Session Error` entry and stops.
pub async fn run_suite(
    executor: &dyn CodeExecutor,
    environment_id: Option<String>,
    code: &str,
    cases: &[TestCase],
    cancel: Option<&CancelSignal>,
) -> Vec<TestCaseResult> {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let request = ExecutionRequest::new(code)
            .with_environment(environment_id.clone())
            .with_stdin(case.input.clone());

        match executor.run(&request, cancel).await {
            Ok(outcome) => results.push(TestCaseResult::from_outcome(case, outcome)),
            Err(error) if error.is_terminal() => {
                tracing::warn!(%error, "test run aborted");
                results.push(TestCaseResult::failed("", "", STATUS_SESSION_ERROR, &error));
                break;
            }
            Err(error) => {
                tracing::warn!(%error, input = %case.input, "test case failed to execute");
                results.push(TestCaseResult::failed(
                    &case.input,
                    &case.expected,
                    STATUS_ERROR,
                    &error,
                ));
            }
        }
    }

    results
}

pub fn passed_count(results: &[TestCaseResult]) -> usize {
    results.iter().filter(|result| result.passed).count()
}
