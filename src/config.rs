//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use code_exec_api::{CodeExecConfig, ExecutorStyle, DEFAULT_CODE_EXEC_BASE_URL};
use interview_api::{InterviewApiConfig, DEFAULT_INTERVIEW_BASE_URL};
use session_store::default_store_root;
use thiserror::Error;

pub const INTERVIEW_API_URL: &str = "INTERVIEW_API_URL";
pub const CODE_EXECUTOR_URL: &str = "CODE_EXECUTOR_URL";
pub const CODE_EXECUTOR_STYLE: &str = "CODE_EXECUTOR_STYLE";
pub const INTERVIEW_STORE_DIR: &str = "INTERVIEW_STORE_DIR";
pub const INTERVIEW_HTTP_TIMEOUT_SEC: &str = "INTERVIEW_HTTP_TIMEOUT_SEC";
pub const INTERVIEW_LOG: &str = "INTERVIEW_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {key}={value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    pub interview_api_url: String,
    pub code_executor_url: String,
    pub executor_style: ExecutorStyle,
    pub store_dir: Option<PathBuf>,
    pub http_timeout: Option<Duration>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let executor_style = match env_string_opt(CODE_EXECUTOR_STYLE) {
            Some(value) => ExecutorStyle::parse(&value).ok_or(ConfigError {
                key: CODE_EXECUTOR_STYLE,
                value,
                reason: "expected direct, session or job-token",
            })?,
            None => ExecutorStyle::default(),
        };

        let http_timeout = match env_string_opt(INTERVIEW_HTTP_TIMEOUT_SEC) {
            Some(value) => Some(parse_timeout(&value).ok_or(ConfigError {
                key: INTERVIEW_HTTP_TIMEOUT_SEC,
                value,
                reason: "expected a positive number of seconds",
            })?),
            None => None,
        };

        Ok(Self {
            interview_api_url: env_string_opt(INTERVIEW_API_URL)
                .unwrap_or_else(|| DEFAULT_INTERVIEW_BASE_URL.to_string()),
            code_executor_url: env_string_opt(CODE_EXECUTOR_URL)
                .unwrap_or_else(|| DEFAULT_CODE_EXEC_BASE_URL.to_string()),
            executor_style,
            store_dir: env_string_opt(INTERVIEW_STORE_DIR).map(PathBuf::from),
            http_timeout,
            log_filter: env_string_opt(INTERVIEW_LOG),
        })
    }

    pub fn store_root(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(default_store_root)
    }

    pub fn interview_api_config(&self) -> InterviewApiConfig {
        let config = InterviewApiConfig::new(&self.interview_api_url);
        match self.http_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }

    pub fn code_exec_config(&self) -> CodeExecConfig {
        let config = CodeExecConfig::new(&self.code_executor_url, self.executor_style);
        match self.http_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(Duration::from_secs_f64)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().to_string())
        }
    })
}
