//! Clients for the remote code-execution service.
//!
//! Three wire protocols sit behind [`session_model::CodeExecutor`]:
//! a single `POST execute` call ([`DirectExecutor`]), a compute session
//! that must become ready before executing ([`SessionExecutor`]), and a
//! submitted job polled by token ([`JobTokenExecutor`]). [`run_suite`]
//! drives any of them over a list of test cases.

pub mod config;
pub mod direct;
pub mod error;
pub mod http;
pub mod job;
pub mod session;
pub mod suite;
pub mod url;

use std::sync::Arc;

use session_model::CodeExecutor;

pub use config::{CodeExecConfig, ExecutorStyle, DEFAULT_CODE_EXEC_BASE_URL};
pub use direct::DirectExecutor;
pub use error::CodeExecError;
pub use job::JobTokenExecutor;
pub use session::SessionExecutor;
pub use suite::{passed_count, run_suite, TestCase, TestCaseResult};

/// Builds the executor selected by `config.style`.
pub fn build_executor(config: CodeExecConfig) -> Result<Arc<dyn CodeExecutor>, CodeExecError> {
    Ok(match config.style {
        ExecutorStyle::Direct => Arc::new(DirectExecutor::new(config)?),
        ExecutorStyle::Session => Arc::new(SessionExecutor::new(config)?),
        ExecutorStyle::JobToken => Arc::new(JobTokenExecutor::new(config)?),
    })
}
