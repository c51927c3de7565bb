use reqwest::Url;

use crate::error::InterviewApiError;

/// Default base URL for the interview session service.
pub const DEFAULT_INTERVIEW_BASE_URL: &str = "http://localhost:8000/api/v1/interview";

/// Normalize a configured base URL.
///
/// Blank input falls back to [`DEFAULT_INTERVIEW_BASE_URL`]; trailing
/// slashes are removed so endpoint segments join cleanly.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_INTERVIEW_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Appends path segments to `base`, percent-encoding each one.
pub fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, InterviewApiError> {
    let normalized = normalize_base_url(base);
    let mut url = Url::parse(&normalized)
        .map_err(|error| InterviewApiError::InvalidBaseUrl(format!("{normalized}: {error}")))?;
    url.path_segments_mut()
        .map_err(|()| InterviewApiError::InvalidBaseUrl(format!("{normalized}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
