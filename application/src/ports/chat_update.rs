//! Chat update events emitted for the presentation layer
//!
//! These events form the output port from the application layer to whatever
//! renders the console. The renderer subscribes to the channel and applies
//! them; no protocol logic lives on the other side.

use kubechat_domain::{Message, MessageId, Session, SessionId, StreamingStatus};

/// Events emitted by the session manager and the send use case
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    // === Sessions ===
    /// The session list changed (order, titles, counts, membership)
    SessionsChanged(Vec<Session>),
    /// A different session became current
    CurrentSessionChanged(SessionId),
    /// The current session's transcript was (re)loaded
    TranscriptLoaded {
        session_id: SessionId,
        messages: Vec<Message>,
    },

    // === Exchange ===
    /// A message was appended to the current transcript
    MessageAdded(Message),
    /// An existing message changed (content appended, frozen, failed)
    MessageUpdated(Message),
    /// Streaming status changed
    Status(StreamingStatus),
    /// The exchange ended; carries the commands the backend ran
    ExchangeFinished {
        message_id: MessageId,
        commands_executed: Vec<String>,
    },

    // === Commands ===
    /// Show the command help
    Help,
    /// The REPL is about to exit
    Exit,
    /// Answer to `/sessions`
    SessionList {
        sessions: Vec<Session>,
        current: SessionId,
    },
    /// A command was rejected (bad arguments, rule violation, backend error)
    CommandError { message: String },
    /// Unknown slash command
    UnknownCommand { command: String },

    // === Notifications ===
    /// Dismissible error notification
    Notification { text: String },
    /// Informational line
    Info { text: String },
}
