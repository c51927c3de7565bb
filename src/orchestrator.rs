//! Phase orchestration for one mounted page.
//!
//! A [`PhaseOrchestrator`] owns the snapshot of one session while a page
//! for one phase is shown. Gateway calls run without holding any lock;
//! their results come back as [`SnapshotEvent`]s and go through
//! one private `apply` path, the only place the snapshot changes:
//! lock, reduce, normalize, persist, unlock. After [`PhaseOrchestrator::unmount`]
//! outstanding calls are cancelled and every late result is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use code_exec_api::{run_suite, TestCase, TestCaseResult};
use session_model::{
    is_available, CancelSignal, CodeExecutor, ExecutionRequest, GatewayError, NewSession, Phase,
    RunOutcome, SessionGateway, SessionSnapshot, TurnReply,
};
use session_store::SnapshotStore;

use crate::navigation::{Navigator, Route};
use crate::reducer::{reduce, SnapshotEvent};

/// Collaborators shared by every page of the client.
#[derive(Clone)]
pub struct Services {
    pub gateway: Arc<dyn SessionGateway>,
    pub executor: Arc<dyn CodeExecutor>,
    pub store: Arc<dyn SnapshotStore>,
    pub navigator: Arc<dyn Navigator>,
}

impl Services {
    pub fn new(
        gateway: Arc<dyn SessionGateway>,
        executor: Arc<dyn CodeExecutor>,
        store: Arc<dyn SnapshotStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            gateway,
            executor,
            store,
            navigator,
        }
    }
}

/// Transient page flags. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// Bootstrap fetch or start action in progress.
    pub starting: bool,
    pub pending_sends: usize,
    pub running: bool,
    /// Bootstrap failure; the page offers [`PhaseOrchestrator::recover`].
    pub error: Option<String>,
    /// Last send or start failure, shown next to the transcript.
    pub inline_error: Option<String>,
    /// Text of the last message the service did not accept.
    pub undelivered: Option<String>,
}

impl PageState {
    pub fn is_loading(&self) -> bool {
        self.pending_sends > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input, or nothing to retry.
    Ignored,
    /// The session already left this page's phase.
    ReadOnly,
    Delivered(TurnReply),
    Failed(GatewayError),
    /// The page was unmounted before the reply arrived.
    Dropped,
}

#[derive(Debug, Default)]
struct FlowGuards {
    start_attempted: bool,
    navigated_to: Option<Phase>,
}

pub struct PhaseOrchestrator {
    session_id: String,
    page: Phase,
    services: Services,
    snapshot: Mutex<SessionSnapshot>,
    page_state: Mutex<PageState>,
    guards: Mutex<FlowGuards>,
    cancel: CancelSignal,
}

impl PhaseOrchestrator {
    /// Hydrates the snapshot from the store; nothing touches the network
    /// until [`PhaseOrchestrator::enter`].
    pub fn new(services: Services, session_id: impl Into<String>, page: Phase) -> Self {
        let session_id = session_id.into();
        let snapshot = services.store.load(&session_id).normalized();
        Self {
            session_id,
            page,
            services,
            snapshot: Mutex::new(snapshot),
            page_state: Mutex::new(PageState::default()),
            guards: Mutex::new(FlowGuards::default()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn page(&self) -> Phase {
        self.page
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock_unpoisoned(&self.snapshot).clone()
    }

    pub fn page_state(&self) -> PageState {
        lock_unpoisoned(&self.page_state).clone()
    }

    /// Whether the known session has reached this page. Before
    /// [`PhaseOrchestrator::enter`] this reflects only the stored snapshot.
    pub fn page_available(&self) -> bool {
        is_available(self.snapshot().phase, self.page)
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.load(Ordering::Acquire)
    }

    /// Bootstrap: fetch, merge, then redirect back or start the phase.
    pub async fn enter(&self) -> Result<(), GatewayError> {
        self.update_page(|state| {
            state.starting = true;
            state.error = None;
        });

        let fetched = self
            .services
            .gateway
            .fetch_session(&self.session_id, Some(&self.cancel))
            .await;
        let view = match fetched {
            Ok(view) => view,
            Err(error) => {
                self.update_page(|state| {
                    state.starting = false;
                    if !matches!(error, GatewayError::Cancelled) {
                        state.error = Some(format!("Failed to load session: {error}"));
                    }
                });
                tracing::warn!(session_id = %self.session_id, %error, "session bootstrap failed");
                return Err(error);
            }
        };

        let remote_phase = view.phase;
        let remote_bucket_empty = view.display_messages.get(self.page).is_empty();
        let Some(snapshot) = self.apply(SnapshotEvent::SessionFetched(view)) else {
            return Ok(());
        };
        let fetched_phase = remote_phase.unwrap_or(snapshot.phase);

        if !is_available(fetched_phase, self.page) {
            self.update_page(|state| state.starting = false);
            tracing::info!(
                session_id = %self.session_id,
                page = %self.page,
                phase = %fetched_phase,
                "session has not reached this page, redirecting"
            );
            self.services
                .navigator
                .navigate(Route::for_phase(fetched_phase, &self.session_id));
            return Ok(());
        }

        if fetched_phase == self.page && remote_bucket_empty {
            self.start_phase().await;
        }
        self.update_page(|state| state.starting = false);
        Ok(())
    }

    /// Fetch and merge without redirecting or starting anything.
    pub async fn refresh(&self) -> Result<(), GatewayError> {
        let view = self
            .services
            .gateway
            .fetch_session(&self.session_id, Some(&self.cancel))
            .await
            .inspect_err(|error| {
                tracing::debug!(session_id = %self.session_id, %error, "silent refresh failed");
            })?;
        self.apply(SnapshotEvent::SessionFetched(view));
        Ok(())
    }

    /// Runs the page's start action once. Returns whether a reply was merged.
    pub async fn start_phase(&self) -> bool {
        {
            let mut guards = lock_unpoisoned(&self.guards);
            if guards.start_attempted {
                tracing::debug!(session_id = %self.session_id, page = %self.page, "start already attempted");
                return false;
            }
            guards.start_attempted = true;
        }

        self.update_page(|state| state.starting = true);
        let result = self
            .services
            .gateway
            .start_phase(&self.session_id, self.page, Some(&self.cancel))
            .await;
        self.update_page(|state| state.starting = false);

        match result {
            Ok(reply) => self.handle_reply(self.page, &reply).await,
            Err(GatewayError::Cancelled) => false,
            Err(error) => {
                lock_unpoisoned(&self.guards).start_attempted = false;
                tracing::warn!(session_id = %self.session_id, page = %self.page, %error, "start action failed");
                self.update_page(|state| {
                    state.inline_error = Some(format!("Failed to start {}: {error}", self.page));
                });
                false
            }
        }
    }

    /// Appends `text` optimistically and posts it.
    ///
    /// Several sends may be in flight at once; each reply is routed on its
    /// own.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        if !self.is_mounted() {
            return SendOutcome::Dropped;
        }

        let send_phase = self.page;
        let appended = self.apply_when(
            |snapshot| snapshot.phase == send_phase,
            SnapshotEvent::UserMessageSent {
                phase: send_phase,
                content: text.to_string(),
            },
        );
        if appended.is_none() {
            return SendOutcome::ReadOnly;
        }

        self.deliver(send_phase, text.to_string()).await
    }

    /// Posts the last undelivered text again without appending it twice.
    pub async fn retry_undelivered(&self) -> SendOutcome {
        let Some(text) = self.page_state().undelivered else {
            return SendOutcome::Ignored;
        };
        if self.snapshot().phase != self.page {
            return SendOutcome::ReadOnly;
        }
        self.deliver(self.page, text).await
    }

    pub fn update_code(&self, code: impl Into<String>) {
        self.apply(SnapshotEvent::CodeEdited(code.into()));
    }

    /// Runs the editor buffer. Failures become an `error` outcome; returns
    /// `None` while another run is active, after unmount, or when the buffer
    /// was edited before the run finished.
    pub async fn run_code(&self) -> Option<RunOutcome> {
        if !self.is_mounted() || !self.begin_run() {
            return None;
        }

        let snapshot = self.snapshot();
        let ran_code = snapshot.code.clone();
        let request = ExecutionRequest::new(snapshot.code).with_environment(snapshot.environment_id);
        let result = self
            .services
            .executor
            .run(&request, Some(&self.cancel))
            .await;
        self.update_page(|state| state.running = false);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(GatewayError::Cancelled) => return None,
            Err(error) => {
                tracing::warn!(session_id = %self.session_id, %error, "code run failed");
                RunOutcome::failed(error.to_string())
            }
        };
        // An edit during the run already invalidated this outcome.
        let recorded = self.apply_when(
            |current| current.code == ran_code,
            SnapshotEvent::RunFinished(outcome.clone()),
        );
        if recorded.is_none() && self.is_mounted() {
            tracing::debug!(session_id = %self.session_id, "discarding outcome of edited code");
        }
        recorded.map(|_| outcome)
    }

    /// Runs the buffer against `cases`. Results are returned, not persisted.
    pub async fn run_tests(&self, cases: &[TestCase]) -> Vec<TestCaseResult> {
        if !self.is_mounted() || !self.begin_run() {
            return Vec::new();
        }

        let snapshot = self.snapshot();
        let results = run_suite(
            self.services.executor.as_ref(),
            snapshot.environment_id,
            &snapshot.code,
            cases,
            Some(&self.cancel),
        )
        .await;
        self.update_page(|state| state.running = false);
        results
    }

    /// Cancels outstanding work; later results change nothing.
    pub fn unmount(&self) {
        if !self.cancel.swap(true, Ordering::AcqRel) {
            tracing::debug!(session_id = %self.session_id, page = %self.page, "page unmounted");
        }
    }

    /// Leaves an errored page for the start route.
    pub fn recover(&self) {
        self.services.navigator.navigate(Route::Start);
    }

    async fn deliver(&self, send_phase: Phase, text: String) -> SendOutcome {
        self.update_page(|state| {
            state.pending_sends += 1;
            state.inline_error = None;
        });
        let code = self.snapshot().code;
        let result = self
            .services
            .gateway
            .post_message(&self.session_id, &text, &code, Some(&self.cancel))
            .await;
        self.update_page(|state| state.pending_sends = state.pending_sends.saturating_sub(1));

        match result {
            Ok(reply) => {
                if !self.handle_reply(send_phase, &reply).await {
                    return SendOutcome::Dropped;
                }
                self.update_page(|state| {
                    if state.undelivered.as_deref() == Some(text.as_str()) {
                        state.undelivered = None;
                    }
                });
                SendOutcome::Delivered(reply)
            }
            Err(GatewayError::Cancelled) => SendOutcome::Dropped,
            Err(_) if !self.is_mounted() => SendOutcome::Dropped,
            Err(error) => {
                tracing::warn!(session_id = %self.session_id, %error, "message not delivered");
                self.update_page(|state| {
                    state.inline_error = Some(format!("Failed to send message: {error}"));
                    state.undelivered = Some(text);
                });
                SendOutcome::Failed(error)
            }
        }
    }

    async fn handle_reply(&self, send_phase: Phase, reply: &TurnReply) -> bool {
        let event = SnapshotEvent::AssistantReplied {
            send_phase,
            reply: reply.clone(),
        };
        if self.apply(event).is_none() {
            return false;
        }

        match reply.phase {
            Some(next) if reply.phase_changed && next != send_phase => self.navigate_forward(next),
            _ if !reply.phase_changed && self.page == Phase::LiveCoding => {
                let _ = self.refresh().await;
            }
            _ => {}
        }
        true
    }

    fn navigate_forward(&self, phase: Phase) {
        if !self.is_mounted() || self.page.is_terminal() || phase <= self.page {
            return;
        }
        {
            let mut guards = lock_unpoisoned(&self.guards);
            if guards.navigated_to.is_some_and(|done| done >= phase) {
                return;
            }
            guards.navigated_to = Some(phase);
        }

        tracing::info!(session_id = %self.session_id, %phase, "phase advanced, navigating");
        self.services
            .navigator
            .navigate(Route::for_phase(phase, &self.session_id));
    }

    fn begin_run(&self) -> bool {
        let mut state = lock_unpoisoned(&self.page_state);
        if state.running {
            return false;
        }
        state.running = true;
        true
    }

    fn apply(&self, event: SnapshotEvent) -> Option<SessionSnapshot> {
        self.apply_when(|_| true, event)
    }

    /// The single mutation path. Returns the new snapshot, or `None` when the
    /// page is unmounted or `accept` rejects the current snapshot.
    fn apply_when(
        &self,
        accept: impl FnOnce(&SessionSnapshot) -> bool,
        event: SnapshotEvent,
    ) -> Option<SessionSnapshot> {
        let mut snapshot = lock_unpoisoned(&self.snapshot);
        if !self.is_mounted() {
            tracing::debug!(session_id = %self.session_id, ?event, "dropping merge after unmount");
            return None;
        }
        if !accept(&snapshot) {
            return None;
        }

        let next = reduce(snapshot.clone(), &event).normalized();
        if let Err(error) = self.services.store.save(&self.session_id, &next) {
            tracing::warn!(session_id = %self.session_id, %error, "snapshot not persisted");
        }
        *snapshot = next.clone();
        Some(next)
    }

    fn update_page(&self, update: impl FnOnce(&mut PageState)) {
        update(&mut lock_unpoisoned(&self.page_state));
    }
}

/// Creates a session from the start form and opens its interview page.
pub async fn create_session(services: &Services, form: &NewSession) -> Result<String, GatewayError> {
    let session_id = services.gateway.create_session(form).await?;
    tracing::info!(%session_id, "session created");
    services
        .navigator
        .navigate(Route::Interview(session_id.clone()));
    Ok(session_id)
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
