//! HTTP client for the interview session service.
//!
//! This crate owns request building, response parsing, and retry policy for
//! the session endpoints, and implements [`session_model::SessionGateway`]
//! on top of them. It holds no session state.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::InterviewApiClient;
pub use config::InterviewApiConfig;
pub use error::InterviewApiError;
pub use payload::{session_view_from_value, turn_reply_from_value, MessageRequest};
pub use url::{normalize_base_url, DEFAULT_INTERVIEW_BASE_URL};
