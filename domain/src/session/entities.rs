//! Session domain entities

use super::ids::{MessageId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to every new session until its first message renames it.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in a session transcript (Entity)
///
/// Assistant messages are created empty and streaming, grow by appended
/// chunks, and are frozen exactly once. Once frozen, every further mutation
/// is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_streaming: bool,
    pub is_error: bool,
}

impl Message {
    /// A finished user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: false,
        }
    }

    /// An empty assistant message that is still receiving content.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            is_streaming: true,
            is_error: false,
        }
    }

    /// A message loaded from stored history.
    pub fn from_history(
        id: MessageId,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp,
            is_streaming: false,
            is_error: false,
        }
    }

    /// Append a chunk. Returns false (and does nothing) if already frozen.
    pub fn append(&mut self, chunk: &str) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.content.push_str(chunk);
        true
    }

    /// Freeze the message as complete. Returns false if it was already frozen.
    pub fn freeze(&mut self) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.is_streaming = false;
        true
    }

    /// Replace the content with an error text and freeze.
    ///
    /// Returns false if the message was already frozen; the content is then
    /// left untouched.
    pub fn fail(&mut self, error_text: impl Into<String>) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.content = error_text.into();
        self.is_error = true;
        self.is_streaming = false;
        true
    }
}

/// A chat session (Entity)
///
/// Identity is the id. An ephemeral session lives only in client memory until
/// its first message replaces it with a persisted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: u32,
    pub is_ephemeral: bool,
}

impl Session {
    /// A new client-only session with a freshly generated local id.
    pub fn ephemeral() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::ephemeral(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            created_at: now,
            last_activity: now,
            message_count: 0,
            is_ephemeral: true,
        }
    }

    /// A session that exists in backend storage.
    pub fn persisted(
        id: SessionId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        last_activity: DateTime<Utc>,
        message_count: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            created_at,
            last_activity,
            message_count,
            is_ephemeral: false,
        }
    }

    /// Record a completed user/assistant exchange.
    pub fn record_exchange(&mut self) {
        self.message_count += 2;
        self.last_activity = Utc::now();
    }
}
