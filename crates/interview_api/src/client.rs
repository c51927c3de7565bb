use std::future::Future;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde_json::Value;
use session_model::{await_or_cancel, is_cancelled, CancelSignal, NewSession, Phase};
use session_model::{SessionView, TurnReply};

use crate::config::InterviewApiConfig;
use crate::error::{parse_error_message, InterviewApiError};
use crate::headers::{build_headers, to_header_map};
use crate::payload::{
    session_id_from_value, session_view_from_value, turn_reply_from_value, MessageRequest,
};
use crate::retry::{is_retryable_http_error, retry_delay};
use crate::url::endpoint_url;

const SESSIONS: &str = "sessions";

#[derive(Debug)]
pub struct InterviewApiClient {
    http: Client,
    config: InterviewApiConfig,
    headers: HeaderMap,
}

impl InterviewApiClient {
    pub fn new(config: InterviewApiConfig) -> Result<Self, InterviewApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let headers = to_header_map(&build_headers(&config))?;
        // Fail at construction rather than on the first request.
        endpoint_url(&config.base_url, &[])?;
        Ok(Self {
            http,
            config,
            headers,
        })
    }

    pub fn config(&self) -> &InterviewApiConfig {
        &self.config
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, InterviewApiError> {
        endpoint_url(&self.config.base_url, segments)
    }

    pub fn build_request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, InterviewApiError> {
        Ok(self
            .http
            .request(method, self.endpoint(segments)?)
            .headers(self.headers.clone()))
    }

    /// `POST /sessions`; returns the new session id.
    pub async fn create_session(&self, request: &NewSession) -> Result<String, InterviewApiError> {
        let body = self.post_json(&[SESSIONS], Some(request), None).await?;
        session_id_from_value(&body)
    }

    /// `GET /sessions/{id}`.
    pub async fn fetch_session(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<SessionView, InterviewApiError> {
        let body = self.get_json(&[SESSIONS, session_id], cancel).await?;
        Ok(session_view_from_value(&body))
    }

    /// Start action for `phase`; `final` uses the summary endpoint.
    pub async fn start_phase(
        &self,
        session_id: &str,
        phase: Phase,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, InterviewApiError> {
        let segments: &[&str] = match phase {
            Phase::Interview => &[SESSIONS, session_id, "start"],
            Phase::LiveCoding => &[SESSIONS, session_id, "live_coding", "start"],
            Phase::Final => return self.start_final_summary(session_id, cancel).await,
        };
        let body = self.post_json::<()>(segments, None, cancel).await?;
        Ok(turn_reply_from_value(&body))
    }

    /// `POST /sessions/{id}/final/start`. The summary reply never moves the
    /// session, so `phase_changed` is forced off.
    pub async fn start_final_summary(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, InterviewApiError> {
        let body = self
            .post_json::<()>(&[SESSIONS, session_id, "final", "start"], None, cancel)
            .await?;
        let mut reply = turn_reply_from_value(&body);
        reply.phase_changed = false;
        Ok(reply)
    }

    /// `POST /sessions/{id}/message`.
    pub async fn post_message(
        &self,
        session_id: &str,
        request: &MessageRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, InterviewApiError> {
        let body = self
            .post_json(&[SESSIONS, session_id, "message"], Some(request), cancel)
            .await?;
        Ok(turn_reply_from_value(&body))
    }

    /// GET with bounded retry on transient failures.
    pub async fn get_json(
        &self,
        segments: &[&str],
        cancel: Option<&CancelSignal>,
    ) -> Result<Value, InterviewApiError> {
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            if is_cancelled(cancel) {
                return Err(InterviewApiError::Cancelled);
            }

            let request = self.build_request(Method::GET, segments)?;
            match cancellable(request.send(), cancel).await? {
                Ok(response) if response.status().is_success() => {
                    return read_json(response, cancel).await;
                }
                Ok(response) => {
                    let status = response.status();
                    let body = cancellable(response.text(), cancel)
                        .await?
                        .unwrap_or_default();
                    if attempt < max_retries && is_retryable_http_error(status.as_u16(), &body) {
                        tracing::debug!(%status, attempt, "retrying session service GET");
                        cancellable(tokio::time::sleep(retry_delay(attempt)), cancel).await?;
                        continue;
                    }
                    return Err(InterviewApiError::Status(
                        status,
                        parse_error_message(status, &body),
                    ));
                }
                Err(error) => {
                    let transient = error.is_connect()
                        || error.is_timeout()
                        || is_retryable_http_error(0, &error.to_string());
                    if attempt < max_retries && transient {
                        tracing::debug!(%error, attempt, "retrying session service GET");
                        cancellable(tokio::time::sleep(retry_delay(attempt)), cancel).await?;
                        continue;
                    }
                    return Err(InterviewApiError::Request(error));
                }
            }
        }

        Err(InterviewApiError::Cancelled)
    }

    /// Single-attempt POST; the service's side effects are not idempotent.
    pub async fn post_json<B>(
        &self,
        segments: &[&str],
        body: Option<&B>,
        cancel: Option<&CancelSignal>,
    ) -> Result<Value, InterviewApiError>
    where
        B: Serialize + ?Sized,
    {
        if is_cancelled(cancel) {
            return Err(InterviewApiError::Cancelled);
        }

        let mut request = self.build_request(Method::POST, segments)?;
        request = match body {
            Some(body) => request.json(body),
            None => request.header(CONTENT_TYPE, "application/json").body("{}"),
        };

        let response = cancellable(request.send(), cancel).await??;
        let status = response.status();
        if !status.is_success() {
            let body = cancellable(response.text(), cancel)
                .await?
                .unwrap_or_default();
            return Err(InterviewApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        read_json(response, cancel).await
    }
}

async fn read_json(
    response: Response,
    cancel: Option<&CancelSignal>,
) -> Result<Value, InterviewApiError> {
    let text = cancellable(response.text(), cancel).await??;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

async fn cancellable<F>(
    future: F,
    cancel: Option<&CancelSignal>,
) -> Result<F::Output, InterviewApiError>
where
    F: Future,
{
    await_or_cancel(future, cancel)
        .await
        .map_err(|_| InterviewApiError::Cancelled)
}
