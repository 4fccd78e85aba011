//! Per-exchange state machine for the chat stream.
//!
//! ```text
//! connecting → streaming → {investigating|chatting} → [analyzing]
//!            → [executing(cmd) ⇄ completed(cmd)]* → {done|error}
//! ```
//!
//! `done` and `error` are terminal. After either one (or a transport
//! failure) every further event is a no-op, so the open assistant message is
//! frozen exactly once.

use super::event::{ChatEvent, RESPONSE_KIND_INVESTIGATION};
use super::status::StreamingStatus;
use crate::session::entities::Message;

/// Content written into the assistant message on a transport failure.
pub const TRANSPORT_FAILURE_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Format the warning block appended for a blocked command.
pub fn blocked_command_block(command: &str, reason: &str) -> String {
    format!("\n\n⚠️ **Command blocked:** {command}\n*Reason: {reason}*")
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// `done` received, or the stream ended cleanly without a terminal event.
    Completed { commands_executed: Vec<String> },
    /// The backend sent an `error` event.
    ProtocolError { error: String },
    /// The request or the body read failed.
    TransportFailure { reason: String },
    /// The exchange was abandoned (view closed, session switched).
    Cancelled,
}

impl ExchangeOutcome {
    /// Returns true if the backend finished the exchange itself (`done` or
    /// `error`), which is when session metadata gets updated.
    pub fn reached_backend_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeOutcome::Completed { .. } | ExchangeOutcome::ProtocolError { .. }
        )
    }
}

/// What applying one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Only the status signal changed.
    Status,
    /// The open message content changed.
    Content,
    /// The exchange reached a terminal state; the message is frozen.
    Finished(ExchangeOutcome),
    /// Unrecognised event type; nothing changed.
    Ignored,
    /// The exchange was already closed; nothing changed.
    AfterTerminal,
}

/// Applies chat events, in arrival order, to one assistant message.
#[derive(Debug, Default)]
pub struct ExchangeInterpreter {
    status: StreamingStatus,
    executed_commands: Vec<String>,
    outcome: Option<ExchangeOutcome>,
}

impl ExchangeInterpreter {
    /// A fresh interpreter in the `connecting` state.
    pub fn new() -> Self {
        Self {
            status: StreamingStatus::Connecting,
            executed_commands: Vec::new(),
            outcome: None,
        }
    }

    pub fn status(&self) -> &StreamingStatus {
        &self.status
    }

    pub fn executed_commands(&self) -> &[String] {
        &self.executed_commands
    }

    pub fn outcome(&self) -> Option<&ExchangeOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// The response headers arrived and the body is being read.
    pub fn start_streaming(&mut self) {
        if !self.is_finished() {
            self.status = StreamingStatus::Streaming;
        }
    }

    /// Apply one decoded event to the open message.
    pub fn apply(&mut self, event: ChatEvent, message: &mut Message) -> Applied {
        if self.is_finished() {
            return Applied::AfterTerminal;
        }

        match event {
            ChatEvent::Metadata { response_type } => {
                self.status = if response_type.as_deref() == Some(RESPONSE_KIND_INVESTIGATION) {
                    StreamingStatus::Investigating
                } else {
                    StreamingStatus::Chatting
                };
                Applied::Status
            }
            ChatEvent::Content { content } => {
                message.append(&content);
                Applied::Content
            }
            ChatEvent::CommandExecuting { command } => {
                self.status = StreamingStatus::ExecutingCommand { command };
                Applied::Status
            }
            ChatEvent::CommandCompleted { command, success } => {
                self.executed_commands.push(command.clone());
                self.status = StreamingStatus::CommandResult { command, success };
                Applied::Status
            }
            ChatEvent::CommandBlocked { command, reason } => {
                message.append(&blocked_command_block(&command, &reason));
                Applied::Content
            }
            ChatEvent::AnalysisStart => {
                self.status = StreamingStatus::Analyzing;
                Applied::Status
            }
            ChatEvent::Error { error } => {
                message.fail(format!("Error: {}", error));
                self.status = StreamingStatus::Error;
                self.finish(ExchangeOutcome::ProtocolError { error })
            }
            ChatEvent::Done { commands_executed } => {
                message.freeze();
                if let Some(commands) = commands_executed {
                    self.executed_commands = commands;
                }
                self.status = StreamingStatus::Done;
                self.finish(ExchangeOutcome::Completed {
                    commands_executed: self.executed_commands.clone(),
                })
            }
            ChatEvent::Unknown => Applied::Ignored,
        }
    }

    /// The body ended without a terminal event: treat it as a completion.
    pub fn end_of_stream(&mut self, message: &mut Message) -> Applied {
        if self.is_finished() {
            return Applied::AfterTerminal;
        }
        message.freeze();
        self.status = StreamingStatus::Done;
        self.finish(ExchangeOutcome::Completed {
            commands_executed: self.executed_commands.clone(),
        })
    }

    /// The transport failed. Overrides any partial content already appended.
    pub fn transport_failure(&mut self, reason: impl Into<String>, message: &mut Message) -> Applied {
        if self.is_finished() {
            return Applied::AfterTerminal;
        }
        message.fail(TRANSPORT_FAILURE_TEXT);
        self.status = StreamingStatus::Error;
        self.finish(ExchangeOutcome::TransportFailure {
            reason: reason.into(),
        })
    }

    /// The exchange was abandoned; keep whatever content arrived.
    pub fn cancel(&mut self, message: &mut Message) -> Applied {
        if self.is_finished() {
            return Applied::AfterTerminal;
        }
        message.freeze();
        self.finish(ExchangeOutcome::Cancelled)
    }

    fn finish(&mut self, outcome: ExchangeOutcome) -> Applied {
        self.outcome = Some(outcome.clone());
        Applied::Finished(outcome)
    }
}
