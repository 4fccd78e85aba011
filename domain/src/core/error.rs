//! Domain error types

use thiserror::Error;

/// Domain-level validation errors.
///
/// These are raised before any backend call is attempted, so a rejected
/// operation never leaves a partial mutation behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Cannot rename an unsaved chat - send a message first")]
    EphemeralSession,

    #[error("Cannot delete last session")]
    LastSession,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl DomainError {
    /// Check if this error was caused by user input rather than session state
    pub fn is_input_error(&self) -> bool {
        matches!(self, DomainError::EmptyMessage | DomainError::EmptyTitle)
    }
}
