//! Application layer for kubechat
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_stream::{ChatRequest, ChatStreamPort, EventStream, StreamError},
    chat_update::ChatUpdate,
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    session_api::{ApiError, CreatedSession, HistoryEntry, SessionApiPort, SessionSummary},
};
pub use use_cases::chat_controller::{ChatController, CommandAction};
pub use use_cases::send_message::{
    CREATE_FAILED_NOTICE, SEND_FAILED_NOTICE, SendError, SendMessageInput, SendMessageOutput,
    SendMessageUseCase,
};
pub use use_cases::session_lifecycle::{SessionError, SessionManager};
