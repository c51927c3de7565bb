use async_trait::async_trait;
use session_model::{
    CancelSignal, GatewayError, NewSession, Phase, SessionGateway, SessionView, TurnReply,
};

use crate::client::InterviewApiClient;
use crate::payload::MessageRequest;

#[async_trait]
impl SessionGateway for InterviewApiClient {
    async fn create_session(&self, request: &NewSession) -> Result<String, GatewayError> {
        Ok(InterviewApiClient::create_session(self, request).await?)
    }

    async fn fetch_session(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<SessionView, GatewayError> {
        Ok(InterviewApiClient::fetch_session(self, session_id, cancel).await?)
    }

    async fn start_phase(
        &self,
        session_id: &str,
        phase: Phase,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        Ok(InterviewApiClient::start_phase(self, session_id, phase, cancel).await?)
    }

    async fn start_final_summary(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        Ok(InterviewApiClient::start_final_summary(self, session_id, cancel).await?)
    }

    async fn post_message(
        &self,
        session_id: &str,
        message: &str,
        current_code: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        let request = MessageRequest::new(message, current_code);
        Ok(InterviewApiClient::post_message(self, session_id, &request, cancel).await?)
    }
}
