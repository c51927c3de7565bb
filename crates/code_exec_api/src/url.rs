use reqwest::Url;

use crate::error::CodeExecError;

/// Joins `segments` onto `base` and appends `query` pairs.
pub fn endpoint_url(
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, CodeExecError> {
    let base = base.trim().trim_end_matches('/');
    let mut url =
        Url::parse(base).map_err(|error| CodeExecError::InvalidBaseUrl(format!("{base}: {error}")))?;
    url.path_segments_mut()
        .map_err(|()| CodeExecError::InvalidBaseUrl(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
