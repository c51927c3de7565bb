use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde_json::Value;
use session_model::{await_or_cancel, is_cancelled, CancelSignal};

use crate::config::CodeExecConfig;
use crate::error::{error_message, CodeExecError};
use crate::url::endpoint_url;

/// Thin JSON transport shared by the executors. Calls are single-attempt;
/// polling loops decide when to ask again.
#[derive(Debug, Clone)]
pub struct ExecHttp {
    http: Client,
    base_url: String,
}

impl ExecHttp {
    pub fn new(config: &CodeExecConfig) -> Result<Self, CodeExecError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        endpoint_url(&config.base_url, &[], &[])?;
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    pub async fn get_json(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        cancel: Option<&CancelSignal>,
    ) -> Result<Value, CodeExecError> {
        let url = endpoint_url(&self.base_url, segments, query)?;
        self.send(self.http.request(Method::GET, url), cancel).await
    }

    pub async fn post_json<B>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        body: &B,
        cancel: Option<&CancelSignal>,
    ) -> Result<Value, CodeExecError>
    where
        B: Serialize + ?Sized,
    {
        let url = endpoint_url(&self.base_url, segments, query)?;
        self.send(self.http.request(Method::POST, url).json(body), cancel)
            .await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        cancel: Option<&CancelSignal>,
    ) -> Result<Value, CodeExecError> {
        if is_cancelled(cancel) {
            return Err(CodeExecError::Cancelled);
        }

        let response = cancellable(request.send(), cancel).await??;
        read_json(response, cancel).await
    }
}

async fn read_json(
    response: Response,
    cancel: Option<&CancelSignal>,
) -> Result<Value, CodeExecError> {
    let status = response.status();
    let text = cancellable(response.text(), cancel).await??;
    if !status.is_success() {
        return Err(CodeExecError::Status(status, error_message(status, &text)));
    }
    Ok(serde_json::from_str(&text)?)
}

pub(crate) async fn cancellable<F>(
    future: F,
    cancel: Option<&CancelSignal>,
) -> Result<F::Output, CodeExecError>
where
    F: Future,
{
    await_or_cancel(future, cancel)
        .await
        .map_err(|_| CodeExecError::Cancelled)
}

/// String field or empty.
pub(crate) fn text_field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
