use std::collections::BTreeMap;
use std::time::Duration;

use crate::retry::MAX_RETRIES;
use crate::url::DEFAULT_INTERVIEW_BASE_URL;

/// Transport configuration for session service requests.
#[derive(Debug, Clone)]
pub struct InterviewApiConfig {
    /// Base URL the `/sessions` endpoints hang off.
    pub base_url: String,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
    /// Retry budget for idempotent GETs after the first attempt.
    pub max_retries: u32,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for InterviewApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INTERVIEW_BASE_URL.to_string(),
            timeout: None,
            max_retries: MAX_RETRIES,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl InterviewApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
