//! Deterministic scripted implementations of the `session_model` gateway
//! contracts.
//!
//! This crate contains no transport logic. Replies are queued per operation
//! and handed out in call order, optionally after a delay, so tests can
//! reproduce out-of-order completions.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use session_model::{
    await_or_cancel, CancelSignal, CodeExecutor, ExecutionRequest, GatewayError, NewSession,
    Phase, RunOutcome, SessionGateway, SessionView, TurnReply,
};

/// Session id returned by [`MockGateway::create_session`] unless overridden.
pub const MOCK_SESSION_ID: &str = "mock-session";

/// One queued reply.
#[derive(Debug, Clone)]
pub struct Scripted<T> {
    pub delay: Duration,
    pub result: Result<T, GatewayError>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(error: GatewayError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Shorthand for a start-action or message reply.
pub fn turn(content: &str, phase: Phase, phase_changed: bool) -> TurnReply {
    TurnReply {
        content: content.to_string(),
        phase: Some(phase),
        phase_changed,
    }
}

/// Calls observed by [`MockGateway`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateSession(NewSession),
    FetchSession(String),
    StartPhase(String, Phase),
    StartFinalSummary(String),
    PostMessage {
        session_id: String,
        message: String,
        current_code: String,
    },
}

#[derive(Debug, Default)]
pub struct MockGateway {
    created_session_id: Mutex<String>,
    session_view: Mutex<SessionView>,
    fetch_replies: Mutex<VecDeque<Scripted<SessionView>>>,
    start_replies: Mutex<VecDeque<Scripted<TurnReply>>>,
    message_replies: Mutex<VecDeque<Scripted<TurnReply>>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        let gateway = Self::default();
        *lock_unpoisoned(&gateway.created_session_id) = MOCK_SESSION_ID.to_string();
        gateway
    }

    /// View returned by `fetch_session` once the fetch queue is empty.
    #[must_use]
    pub fn with_session_view(self, view: SessionView) -> Self {
        self.set_session_view(view);
        self
    }

    pub fn set_session_view(&self, view: SessionView) {
        *lock_unpoisoned(&self.session_view) = view;
    }

    pub fn set_created_session_id(&self, session_id: impl Into<String>) {
        *lock_unpoisoned(&self.created_session_id) = session_id.into();
    }

    pub fn push_fetch(&self, reply: Scripted<SessionView>) {
        lock_unpoisoned(&self.fetch_replies).push_back(reply);
    }

    /// Queues a reply shared by `start_phase` and `start_final_summary`.
    pub fn push_start(&self, reply: Scripted<TurnReply>) {
        lock_unpoisoned(&self.start_replies).push_back(reply);
    }

    pub fn push_message(&self, reply: Scripted<TurnReply>) {
        lock_unpoisoned(&self.message_replies).push_back(reply);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        lock_unpoisoned(&self.calls).clone()
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.count(|call| matches!(call, GatewayCall::FetchSession(_)))
    }

    /// Start actions of any phase, the final summary included.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                GatewayCall::StartPhase(..) | GatewayCall::StartFinalSummary(_)
            )
        })
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.count(|call| matches!(call, GatewayCall::PostMessage { .. }))
    }

    fn count(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        lock_unpoisoned(&self.calls)
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn record(&self, call: GatewayCall) {
        lock_unpoisoned(&self.calls).push(call);
    }

    fn next_turn(queue: &Mutex<VecDeque<Scripted<TurnReply>>>, what: &str) -> Scripted<TurnReply> {
        lock_unpoisoned(queue)
            .pop_front()
            .unwrap_or_else(|| Scripted::err(GatewayError::network(format!("no scripted {what}"))))
    }
}

#[async_trait]
impl SessionGateway for MockGateway {
    async fn create_session(&self, request: &NewSession) -> Result<String, GatewayError> {
        self.record(GatewayCall::CreateSession(request.clone()));
        Ok(lock_unpoisoned(&self.created_session_id).clone())
    }

    async fn fetch_session(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<SessionView, GatewayError> {
        self.record(GatewayCall::FetchSession(session_id.to_string()));
        let queued = lock_unpoisoned(&self.fetch_replies).pop_front();
        let scripted = match queued {
            Some(scripted) => scripted,
            None => Scripted::ok(lock_unpoisoned(&self.session_view).clone()),
        };
        deliver(scripted, cancel).await
    }

    async fn start_phase(
        &self,
        session_id: &str,
        phase: Phase,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        if phase == Phase::Final {
            return self.start_final_summary(session_id, cancel).await;
        }
        self.record(GatewayCall::StartPhase(session_id.to_string(), phase));
        let scripted = Self::next_turn(&self.start_replies, "start reply");
        deliver(scripted, cancel).await
    }

    async fn start_final_summary(
        &self,
        session_id: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        self.record(GatewayCall::StartFinalSummary(session_id.to_string()));
        let scripted = Self::next_turn(&self.start_replies, "summary reply");
        let mut reply = deliver(scripted, cancel).await?;
        reply.phase_changed = false;
        Ok(reply)
    }

    async fn post_message(
        &self,
        session_id: &str,
        message: &str,
        current_code: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<TurnReply, GatewayError> {
        self.record(GatewayCall::PostMessage {
            session_id: session_id.to_string(),
            message: message.to_string(),
            current_code: current_code.to_string(),
        });
        let scripted = Self::next_turn(&self.message_replies, "message reply");
        deliver(scripted, cancel).await
    }
}

/// Scripted code executor; an empty queue yields a completed run with no
/// output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    replies: Mutex<VecDeque<Scripted<RunOutcome>>>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl MockExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Scripted<RunOutcome>) {
        lock_unpoisoned(&self.replies).push_back(reply);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ExecutionRequest> {
        lock_unpoisoned(&self.requests).clone()
    }
}

/// A finished run printing `stdout`.
pub fn completed(stdout: &str) -> RunOutcome {
    RunOutcome {
        stdout: stdout.to_string(),
        status: Some("completed".to_string()),
        execution_time: Some(0.01),
        exit_code: Some(0),
        ..RunOutcome::default()
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    async fn run(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<RunOutcome, GatewayError> {
        lock_unpoisoned(&self.requests).push(request.clone());
        let scripted = lock_unpoisoned(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Scripted::ok(completed("")));
        deliver(scripted, cancel).await
    }
}

async fn deliver<T>(scripted: Scripted<T>, cancel: Option<&CancelSignal>) -> Result<T, GatewayError> {
    if !scripted.delay.is_zero() {
        await_or_cancel(tokio::time::sleep(scripted.delay), cancel).await?;
    }
    scripted.result
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
