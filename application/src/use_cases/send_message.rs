//! Send Message use case
//!
//! Drives one streaming exchange end to end:
//!
//! 1. reject blank input and concurrent sends
//! 2. persist an ephemeral target session (abort the send on failure)
//! 3. append the user message and an empty streaming assistant message
//! 4. open the stream and apply every event through [`ExchangeInterpreter`]
//! 5. on a backend terminal event, update session metadata
//!
//! Every call reaches exactly one terminal outcome, and the status signal is
//! reset to idle at the end whatever happened.

use crate::ports::chat_stream::{ChatRequest, ChatStreamPort, StreamError};
use crate::ports::chat_update::ChatUpdate;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::session_api::{ApiError, SessionApiPort};
use crate::use_cases::session_lifecycle::{SessionError, SessionManager};
use futures::StreamExt;
use kubechat_domain::util::log_preview;
use kubechat_domain::{
    Applied, ChatEvent, DomainError, ExchangeInterpreter, ExchangeOutcome, Message, MessageId,
    SessionId, StreamingStatus, is_blank,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Notification shown when the exchange fails at the transport level.
pub const SEND_FAILED_NOTICE: &str = "Failed to send message";

/// Notification shown when an ephemeral session cannot be persisted.
pub const CREATE_FAILED_NOTICE: &str = "Failed to create new chat";

/// Reasons a send is refused before any message is appended.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("An exchange is already in progress")]
    InFlight,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to create session: {0}")]
    SessionCreate(ApiError),
}

impl From<SessionError> for SendError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Domain(e) => SendError::Domain(e),
            SessionError::Api(e) => SendError::SessionCreate(e),
        }
    }
}

/// Input for one send.
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub session_id: SessionId,
    pub text: String,
}

impl SendMessageInput {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
        }
    }
}

/// Result of a send that got as far as dispatching the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageOutput {
    /// The session the exchange ran against (the persisted id if the target
    /// was ephemeral).
    pub session_id: SessionId,
    /// The assistant message of this exchange.
    pub message_id: MessageId,
    pub outcome: ExchangeOutcome,
}

/// Marks an exchange as in flight for as long as it is alive, and keeps its
/// cancellation token reachable through [`SendMessageUseCase::cancel`].
struct ExchangeGuard<'a> {
    in_flight: &'a AtomicBool,
    active: &'a StdMutex<Option<CancellationToken>>,
}

impl<'a> ExchangeGuard<'a> {
    fn acquire(
        in_flight: &'a AtomicBool,
        active: &'a StdMutex<Option<CancellationToken>>,
        cancel: &CancellationToken,
    ) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        *active.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
        Some(Self { in_flight, active })
    }
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        // Clear the token before releasing the flag.
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Use case for sending one chat message and streaming the reply
pub struct SendMessageUseCase<S: ChatStreamPort, A: SessionApiPort> {
    stream_port: Arc<S>,
    sessions: Arc<Mutex<SessionManager<A>>>,
    in_flight: AtomicBool,
    /// Token of the running exchange, if any
    active: StdMutex<Option<CancellationToken>>,
    tx: mpsc::UnboundedSender<ChatUpdate>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<S: ChatStreamPort, A: SessionApiPort> SendMessageUseCase<S, A> {
    pub fn new(
        stream_port: Arc<S>,
        sessions: Arc<Mutex<SessionManager<A>>>,
        tx: mpsc::UnboundedSender<ChatUpdate>,
    ) -> Self {
        Self {
            stream_port,
            sessions,
            in_flight: AtomicBool::new(false),
            active: StdMutex::new(None),
            tx,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Returns true while an exchange is running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Cancel the running exchange, if any. The message keeps the content
    /// received so far.
    pub fn cancel(&self) -> bool {
        let token = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Send a message and stream the reply into the transcript.
    ///
    /// `Err` means nothing was appended. Transport and protocol failures are
    /// reported through the returned outcome, never as `Err`.
    pub async fn execute(
        &self,
        input: SendMessageInput,
        cancel: CancellationToken,
    ) -> Result<SendMessageOutput, SendError> {
        if is_blank(&input.text) {
            return Err(DomainError::EmptyMessage.into());
        }
        let _guard = ExchangeGuard::acquire(&self.in_flight, &self.active, &cancel)
            .ok_or(SendError::InFlight)?;
        let text = input.text.trim().to_string();

        let prepared = self.prepare(&input.session_id, &text).await;
        let (session_id, message_id, first_message) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                if matches!(e, SendError::SessionCreate(_)) {
                    self.notify(CREATE_FAILED_NOTICE);
                }
                return Err(e);
            }
        };

        info!(
            "Sending to session {}: {}",
            session_id,
            log_preview(&text, 80)
        );
        self.conversation_logger.log(ConversationEvent::new(
            "exchange_started",
            serde_json::json!({ "session_id": session_id.as_str(), "message": text }),
        ));

        let outcome = self
            .stream_exchange(&session_id, &message_id, &text, &cancel)
            .await;

        match &outcome {
            ExchangeOutcome::TransportFailure { reason } => {
                warn!("Streaming error: {}", reason);
                self.notify(SEND_FAILED_NOTICE);
            }
            ExchangeOutcome::Cancelled => {
                debug!("Exchange on session {} cancelled", session_id);
            }
            _ => {}
        }
        if outcome.reached_backend_terminal() {
            let first = first_message.then_some(text.as_str());
            self.sessions
                .lock()
                .await
                .record_exchange(&session_id, first)
                .await;
        }

        let commands_executed = match &outcome {
            ExchangeOutcome::Completed { commands_executed } => commands_executed.clone(),
            _ => Vec::new(),
        };
        self.conversation_logger.log(ConversationEvent::new(
            "exchange_finished",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "outcome": outcome_label(&outcome),
                "commands_executed": commands_executed,
            }),
        ));
        self.emit(ChatUpdate::ExchangeFinished {
            message_id: message_id.clone(),
            commands_executed,
        });
        self.emit(ChatUpdate::Status(StreamingStatus::Idle));

        Ok(SendMessageOutput {
            session_id,
            message_id,
            outcome,
        })
    }

    /// Resolve the target session and append the user message and the
    /// assistant placeholder. Returns whether this is the session's first
    /// message.
    async fn prepare(
        &self,
        requested: &SessionId,
        text: &str,
    ) -> Result<(SessionId, MessageId, bool), SendError> {
        let mut sessions = self.sessions.lock().await;

        if sessions.current_session_id() != requested {
            sessions.switch_to(requested).await?;
        }
        let session_id = sessions.persist_on_first_send(requested).await?;

        let stored_count = sessions
            .find(&session_id)
            .map(|s| s.message_count)
            .unwrap_or(0);
        let first_message = sessions.transcript().user_message_count() == 0 && stored_count == 0;

        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        sessions.append_message(&session_id, Message::user(text));
        sessions.append_message(&session_id, placeholder);
        self.emit(ChatUpdate::Status(StreamingStatus::Connecting));

        Ok((session_id, message_id, first_message))
    }

    async fn stream_exchange(
        &self,
        session_id: &SessionId,
        message_id: &MessageId,
        text: &str,
        cancel: &CancellationToken,
    ) -> ExchangeOutcome {
        let mut interpreter = ExchangeInterpreter::new();
        let request = ChatRequest::new(text, session_id.clone());

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.stream_port.open_stream(&request) => Some(opened),
        };
        let mut stream = match opened {
            None => return self.finish_cancelled(&mut interpreter, session_id, message_id).await,
            Some(Err(e)) => {
                return self
                    .finish_transport_failure(&mut interpreter, session_id, message_id, e)
                    .await;
            }
            Some(Ok(stream)) => stream,
        };

        interpreter.start_streaming();
        self.emit(ChatUpdate::Status(interpreter.status().clone()));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return self.finish_cancelled(&mut interpreter, session_id, message_id).await;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    if let Some(outcome) = self
                        .apply_event(&mut interpreter, session_id, message_id, event)
                        .await
                    {
                        return outcome;
                    }
                }
                Some(Err(e)) => {
                    return self
                        .finish_transport_failure(&mut interpreter, session_id, message_id, e)
                        .await;
                }
                None => {
                    warn!("Stream ended without a terminal event");
                    let mut sessions = self.sessions.lock().await;
                    let applied = sessions
                        .update_message(session_id, message_id, |m| interpreter.end_of_stream(m));
                    drop(sessions);
                    return self.conclude(&interpreter, applied);
                }
            }
        }
    }

    /// Apply one event. Returns the outcome once the exchange is closed.
    async fn apply_event(
        &self,
        interpreter: &mut ExchangeInterpreter,
        session_id: &SessionId,
        message_id: &MessageId,
        event: ChatEvent,
    ) -> Option<ExchangeOutcome> {
        let kind = event.kind();
        let mut sessions = self.sessions.lock().await;
        let Some((applied, snapshot)) =
            sessions.update_message(session_id, message_id, |m| interpreter.apply(event, m))
        else {
            debug!("Session {} is no longer displayed, dropping exchange", session_id);
            return Some(ExchangeOutcome::Cancelled);
        };
        drop(sessions);

        match applied {
            Applied::Status => {
                debug!("Stream: {} -> {}", kind, interpreter.status());
                self.emit(ChatUpdate::Status(interpreter.status().clone()));
                None
            }
            Applied::Content => {
                self.emit(ChatUpdate::MessageUpdated(snapshot));
                None
            }
            Applied::Finished(outcome) => {
                debug!("Stream: {} closed the exchange", kind);
                self.emit(ChatUpdate::MessageUpdated(snapshot));
                self.emit(ChatUpdate::Status(interpreter.status().clone()));
                Some(outcome)
            }
            Applied::Ignored => {
                debug!("Unknown event type, ignoring");
                None
            }
            Applied::AfterTerminal => interpreter.outcome().cloned(),
        }
    }

    async fn finish_transport_failure(
        &self,
        interpreter: &mut ExchangeInterpreter,
        session_id: &SessionId,
        message_id: &MessageId,
        error: StreamError,
    ) -> ExchangeOutcome {
        let reason = error.to_string();
        let applied = self
            .sessions
            .lock()
            .await
            .update_message(session_id, message_id, |m| {
                interpreter.transport_failure(reason.clone(), m)
            });
        match applied {
            Some(applied) => self.conclude(interpreter, Some(applied)),
            None => ExchangeOutcome::TransportFailure { reason },
        }
    }

    async fn finish_cancelled(
        &self,
        interpreter: &mut ExchangeInterpreter,
        session_id: &SessionId,
        message_id: &MessageId,
    ) -> ExchangeOutcome {
        let applied = self
            .sessions
            .lock()
            .await
            .update_message(session_id, message_id, |m| interpreter.cancel(m));
        self.conclude(interpreter, applied)
    }

    /// Publish the final message snapshot and return the recorded outcome.
    fn conclude(
        &self,
        interpreter: &ExchangeInterpreter,
        applied: Option<(Applied, Message)>,
    ) -> ExchangeOutcome {
        if let Some((Applied::Finished(_), snapshot)) = &applied {
            self.emit(ChatUpdate::MessageUpdated(snapshot.clone()));
            self.emit(ChatUpdate::Status(interpreter.status().clone()));
        }
        interpreter
            .outcome()
            .cloned()
            .unwrap_or(ExchangeOutcome::Cancelled)
    }

    fn notify(&self, text: &str) {
        self.emit(ChatUpdate::Notification {
            text: text.to_string(),
        });
    }

    fn emit(&self, update: ChatUpdate) {
        let _ = self.tx.send(update);
    }
}

fn outcome_label(outcome: &ExchangeOutcome) -> &'static str {
    match outcome {
        ExchangeOutcome::Completed { .. } => "completed",
        ExchangeOutcome::ProtocolError { .. } => "protocol_error",
        ExchangeOutcome::TransportFailure { .. } => "transport_failure",
        ExchangeOutcome::Cancelled => "cancelled",
    }
}
