use std::fmt;
use std::time::Duration;

pub const DEFAULT_CODE_EXEC_BASE_URL: &str = "http://localhost:8000/api/v1/code";

/// Wire protocol spoken by the execution service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutorStyle {
    /// `POST execute`, result in the response.
    #[default]
    Direct,
    /// Compute session: create, poll until ready, then execute.
    Session,
    /// Submit a job, then poll its token until it leaves the queue.
    JobToken,
}

impl ExecutorStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "session" => Some(Self::Session),
            "job-token" | "job_token" | "jobtoken" => Some(Self::JobToken),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Session => "session",
            Self::JobToken => "job-token",
        }
    }
}

impl fmt::Display for ExecutorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CodeExecConfig {
    pub base_url: String,
    pub style: ExecutorStyle,
    pub timeout: Option<Duration>,
    /// Environment sent when the snapshot has none.
    pub default_environment: String,
    pub filename: String,
    pub session_poll_interval: Duration,
    pub session_poll_attempts: u32,
    pub job_poll_interval: Duration,
    pub job_poll_attempts: u32,
    /// Job-token `language_id` used when the environment is not numeric.
    pub default_language_id: u32,
}

impl Default for CodeExecConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CODE_EXEC_BASE_URL.to_string(),
            style: ExecutorStyle::Direct,
            timeout: None,
            default_environment: "python".to_string(),
            filename: "main.py".to_string(),
            session_poll_interval: Duration::from_millis(500),
            session_poll_attempts: 30,
            job_poll_interval: Duration::from_secs(1),
            job_poll_attempts: 60,
            default_language_id: 71,
        }
    }
}

impl CodeExecConfig {
    pub fn new(base_url: impl Into<String>, style: ExecutorStyle) -> Self {
        Self {
            base_url: base_url.into(),
            style,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_session_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.session_poll_interval = interval;
        self.session_poll_attempts = attempts;
        self
    }

    pub fn with_job_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.job_poll_interval = interval;
        self.job_poll_attempts = attempts;
        self
    }

    pub fn with_default_language_id(mut self, language_id: u32) -> Self {
        self.default_language_id = language_id;
        self
    }

    pub(crate) fn environment_for(&self, environment_id: Option<&str>) -> String {
        environment_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(&self.default_environment)
            .to_string()
    }
}
