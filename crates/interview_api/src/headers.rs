use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::InterviewApiConfig;
use crate::error::InterviewApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const DEFAULT_USER_AGENT: &str = concat!("interview_client/", env!("CARGO_PKG_VERSION"));

/// Build a deterministic header map for session service requests.
///
/// Extra headers from the config are applied last and may override the
/// defaults.
pub fn build_headers(config: &InterviewApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_USER_AGENT.to_owned(),
        config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
            .to_owned(),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(key.to_ascii_lowercase(), value.clone());
    }

    headers
}

pub fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, InterviewApiError> {
    let mut out = HeaderMap::new();
    for (key, value) in headers {
        out.insert(
            HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| InterviewApiError::InvalidHeader(format!("invalid header key: {key}")))?,
            HeaderValue::from_str(value).map_err(|_| {
                InterviewApiError::InvalidHeader(format!("invalid header value for {key}"))
            })?,
        );
    }
    Ok(out)
}
