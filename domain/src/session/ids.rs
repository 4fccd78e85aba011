//! Identifier value objects for sessions and messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix of locally generated session ids. Such ids are never sent to the
/// backend.
pub const EPHEMERAL_PREFIX: &str = "temp_";

static LAST_EPHEMERAL_MILLIS: AtomicU64 = AtomicU64::new(0);
static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Identity of a chat session.
///
/// Persisted sessions carry the server-issued id; ephemeral sessions carry a
/// locally unique `temp_<millis>` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a SessionId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new locally unique ephemeral id.
    ///
    /// The numeric part is the current time in milliseconds, bumped forward
    /// when needed so that no two ids in this process collide.
    pub fn ephemeral() -> Self {
        let now = current_timestamp();
        let next = |last: u64| Some(now.max(last + 1));
        let previous = LAST_EPHEMERAL_MILLIS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, next)
            .unwrap_or(now);
        Self(format!("{EPHEMERAL_PREFIX}{}", now.max(previous + 1)))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Identity of a transcript message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a MessageId from an existing string (e.g. a history row id).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new process-unique id for a locally created message.
    pub fn generate() -> Self {
        let seq = MESSAGE_SEQ.fetch_add(1, Ordering::SeqCst);
        Self(format!("local-{}-{}", current_timestamp(), seq))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
