//! Chat session domain.
//!
//! - [`entities::Session`] — a chat session, ephemeral or persisted
//! - [`entities::Message`] — a single transcript message
//! - [`transcript::Transcript`] — the ordered messages of one session
//! - [`ids`] — session and message identifiers

pub mod entities;
pub mod ids;
pub mod transcript;
