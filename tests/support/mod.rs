#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use gateway_mock::{turn, MockExecutor, MockGateway, Scripted};
use interview_client::{PhaseOrchestrator, RecordingNavigator, Services};
use session_model::{Message, MessagesByPhase, Phase, SessionView, TurnReply};
use session_store::{MemorySnapshotStore, SnapshotStore};

pub const SESSION_ID: &str = "s-42";

pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub executor: Arc<MockExecutor>,
    pub store: Arc<dyn SnapshotStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemorySnapshotStore::new()))
    }

    pub fn with_store(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            gateway: Arc::new(MockGateway::new()),
            executor: Arc::new(MockExecutor::new()),
            store,
            navigator: Arc::new(RecordingNavigator::new()),
        }
    }

    pub fn services(&self) -> Services {
        Services::new(
            self.gateway.clone(),
            self.executor.clone(),
            Arc::clone(&self.store),
            self.navigator.clone(),
        )
    }

    pub fn page(&self, page: Phase) -> PhaseOrchestrator {
        PhaseOrchestrator::new(self.services(), SESSION_ID, page)
    }

    /// Mounts `page` and runs its bootstrap, which must succeed.
    pub async fn entered(&self, page: Phase) -> PhaseOrchestrator {
        let orchestrator = self.page(page);
        orchestrator.enter().await.expect("bootstrap succeeds");
        orchestrator
    }

    pub fn reply(&self, content: &str, phase: Phase, phase_changed: bool) {
        self.gateway
            .push_message(Scripted::ok(turn(content, phase, phase_changed)));
    }

    pub fn delayed_reply(&self, reply: TurnReply, delay_ms: u64) {
        self.gateway
            .push_message(Scripted::ok(reply).after(Duration::from_millis(delay_ms)));
    }
}

/// Remote view in `phase` with the given transcripts.
pub fn view(phase: Phase, buckets: &[(Phase, Vec<Message>)]) -> SessionView {
    let mut display_messages = MessagesByPhase::default();
    for (bucket, messages) in buckets {
        *display_messages.get_mut(*bucket) = messages.clone();
    }
    SessionView {
        phase: Some(phase),
        display_messages,
        ..SessionView::default()
    }
}

/// Remote view in `phase` that already has a greeting in its own bucket, so
/// entering its page does not start anything.
pub fn started_view(phase: Phase) -> SessionView {
    view(phase, &[(phase, vec![Message::assistant("Welcome back")])])
}
