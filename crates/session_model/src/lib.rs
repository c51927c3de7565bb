//! Shared contract for the interview session client.
//!
//! This crate defines the phase model, the persisted session snapshot and
//! its normalizer, and the transport-neutral gateway traits that the
//! orchestrator drives. It contains no HTTP, storage, or UI code.

pub mod cancel;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod phase;
pub mod snapshot;

pub use cancel::{await_or_cancel, is_cancelled, sleep_or_cancel, CancelSignal};
pub use error::GatewayError;
pub use gateway::{
    CodeExecutor, ExecutionRequest, Level, LiveCodingView, NewSession, SessionGateway,
    SessionView, TurnReply,
};
pub use normalize::{
    environment_id_from_value, message_from_value, messages_from_value, seconds_from_value,
};
pub use phase::{is_available, phase_index, phase_index_of, Phase, PHASES};
pub use snapshot::{Message, MessagesByPhase, Role, RunOutcome, SessionSnapshot};
