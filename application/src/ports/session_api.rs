//! Session API port
//!
//! The backend's session storage: list, history, create, rename, delete.
//! Ephemeral sessions never reach this port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubechat_domain::{Message, MessageId, Role, Session, SessionId};
use thiserror::Error;

/// Errors from the session API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request rejected by backend: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A stored session as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: u32,
}

impl SessionSummary {
    pub fn into_session(self) -> Session {
        Session::persisted(
            self.session_id,
            self.title,
            self.created_at,
            self.last_activity,
            self.message_count,
        )
    }
}

/// One stored message of a session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn into_message(self) -> Message {
        Message::from_history(MessageId::new(self.id), self.role, self.message, self.timestamp)
    }
}

/// Result of creating a session in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub title: String,
}

/// Backend session storage for the signed-in user.
#[async_trait]
pub trait SessionApiPort: Send + Sync {
    /// Stored sessions, most recent first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError>;

    /// Ordered message history of a stored session.
    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Create a stored session with the given title.
    async fn create_session(&self, title: &str) -> Result<CreatedSession, ApiError>;

    /// Rename a stored session.
    async fn rename_session(&self, session_id: &SessionId, title: &str) -> Result<(), ApiError>;

    /// Delete a stored session.
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError>;
}
