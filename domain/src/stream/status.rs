//! Transient streaming status shown while an exchange is in flight.

use std::fmt;

/// What the current exchange is doing.
///
/// Process-local UI state: never persisted, reset to [`Idle`](Self::Idle)
/// when an exchange ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamingStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Investigating,
    Chatting,
    Analyzing,
    ExecutingCommand {
        command: String,
    },
    CommandResult {
        command: String,
        success: bool,
    },
    Done,
    Error,
}

impl fmt::Display for StreamingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamingStatus::Idle => write!(f, "idle"),
            StreamingStatus::Connecting => write!(f, "connecting"),
            StreamingStatus::Streaming => write!(f, "streaming"),
            StreamingStatus::Investigating => write!(f, "investigating"),
            StreamingStatus::Chatting => write!(f, "chatting"),
            StreamingStatus::Analyzing => write!(f, "analyzing"),
            StreamingStatus::ExecutingCommand { command } => write!(f, "running: {}", command),
            StreamingStatus::CommandResult { command, success } => {
                if *success {
                    write!(f, "command completed: {}", command)
                } else {
                    write!(f, "command failed: {}", command)
                }
            }
            StreamingStatus::Done => write!(f, "done"),
            StreamingStatus::Error => write!(f, "error"),
        }
    }
}
