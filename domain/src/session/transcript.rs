//! Ordered message list of a single session.

use super::entities::{Message, Role};
use super::ids::{MessageId, SessionId};

/// The transcript of one session.
///
/// Messages are owned by exactly one transcript and never shared.
#[derive(Debug, Clone)]
pub struct Transcript {
    session_id: SessionId,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
        }
    }

    pub fn with_messages(session_id: SessionId, messages: Vec<Message>) -> Self {
        Self {
            session_id,
            messages,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages sent by the user.
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Point the transcript at a new session id.
    ///
    /// Used when an ephemeral session is replaced by its persisted
    /// counterpart: the transcript content carries over unchanged.
    pub fn rebind(&mut self, session_id: SessionId) {
        self.session_id = session_id;
    }
}
