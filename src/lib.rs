//! Headless client for phased interview sessions.
//!
//! The crate keeps a locally persisted [`session_model::SessionSnapshot`] in
//! step with the remote interview service while a page for one phase is
//! mounted. Transport lives in `interview_api` and `code_exec_api`;
//! persistence in `session_store`. Hosts drive a [`PhaseOrchestrator`] and
//! follow the routes it hands to their [`Navigator`].

pub mod commands;
pub mod config;
pub mod logging;
pub mod navigation;
pub mod orchestrator;
pub mod reducer;

pub use config::{ConfigError, EnvConfig};
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use orchestrator::{create_session, PageState, PhaseOrchestrator, SendOutcome, Services};
pub use reducer::{reduce, reply_target, SnapshotEvent};
