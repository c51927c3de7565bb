//! Pure snapshot transitions.
//!
//! Every change to a [`SessionSnapshot`] is expressed as a [`SnapshotEvent`]
//! and applied by [`reduce`]. The function has no I/O so that ordering,
//! persistence and staleness can be handled in one place by the caller.

use session_model::{Message, Phase, RunOutcome, SessionSnapshot, SessionView, TurnReply};

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// Optimistic user message, appended before the service answers.
    UserMessageSent { phase: Phase, content: String },
    /// Reply to a start action or message sent while `send_phase` was active.
    AssistantReplied { send_phase: Phase, reply: TurnReply },
    /// Authoritative session fetched from the service.
    SessionFetched(SessionView),
    CodeEdited(String),
    RunFinished(RunOutcome),
}

/// Bucket that receives the assistant message of `reply`.
///
/// A reported transition routes the message to the new phase. Without one
/// the send-time phase is used, unless the service reports a later phase,
/// which happens when another reply already moved the session.
pub fn reply_target(send_phase: Phase, reply: &TurnReply) -> Phase {
    let reported = reply.phase.unwrap_or(send_phase);
    if reply.phase_changed {
        reported
    } else {
        send_phase.max(reported)
    }
}

pub fn reduce(mut snapshot: SessionSnapshot, event: &SnapshotEvent) -> SessionSnapshot {
    match event {
        SnapshotEvent::UserMessageSent { phase, content } => {
            snapshot
                .messages_by_phase
                .push(*phase, Message::user(content.clone()));
        }
        SnapshotEvent::AssistantReplied { send_phase, reply } => {
            if !reply.content.is_empty() {
                snapshot.messages_by_phase.push(
                    reply_target(*send_phase, reply),
                    Message::assistant(reply.content.clone()),
                );
            }
            if let Some(reported) = reply.phase {
                snapshot.phase = snapshot.phase.max(reported);
            }
        }
        SnapshotEvent::SessionFetched(view) => merge_view(&mut snapshot, view),
        SnapshotEvent::CodeEdited(code) => {
            snapshot.code = code.clone();
            snapshot.run_outcome = None;
        }
        SnapshotEvent::RunFinished(outcome) => {
            snapshot.run_outcome = Some(outcome.clone());
        }
    }
    snapshot
}

fn merge_view(snapshot: &mut SessionSnapshot, view: &SessionView) {
    if let Some(phase) = view.phase {
        snapshot.phase = snapshot.phase.max(phase);
    }
    if let Some(info) = &view.session_info {
        snapshot.session_info = Some(info.clone());
    }

    for phase in session_model::PHASES {
        let remote = view.display_messages.get(phase);
        if !remote.is_empty() {
            *snapshot.messages_by_phase.get_mut(phase) = remote.to_vec();
        }
    }

    if let Some(code) = view.live_coding.editor_code() {
        snapshot.code = code.to_string();
        snapshot.run_outcome = None;
    }
    if let Some(environment_id) = &view.live_coding.environment_id {
        snapshot.environment_id = Some(environment_id.clone());
    }
}
