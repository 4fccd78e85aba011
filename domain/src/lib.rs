//! Domain layer for kubechat
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Sessions
//!
//! A chat session is either **ephemeral** (client memory only, local
//! `temp_` id) or **persisted** (server-issued id). An ephemeral session is
//! replaced in place by a persisted one when its first message is sent.
//!
//! ## Exchanges
//!
//! Every user message opens one streaming exchange. The backend answers with
//! [`ChatEvent`]s which the [`ExchangeInterpreter`] applies to the open
//! assistant [`Message`] until exactly one terminal outcome is reached.

pub mod core;
pub mod session;
pub mod stream;
pub mod util;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    string::{TITLE_MAX_CHARS, derive_title, is_blank},
};
pub use session::{
    entities::{DEFAULT_SESSION_TITLE, Message, Role, Session},
    ids::{EPHEMERAL_PREFIX, MessageId, SessionId},
    transcript::Transcript,
};
pub use stream::{
    event::ChatEvent,
    interpreter::{Applied, ExchangeInterpreter, ExchangeOutcome, TRANSPORT_FAILURE_TEXT},
    status::StreamingStatus,
};
