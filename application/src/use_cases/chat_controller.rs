//! Chat Controller
//!
//! Keeps command handling out of the REPL. Slash commands are parsed and
//! dispatched to the session manager, plain input goes to the send use case.
//! Everything the user should see is emitted as [`ChatUpdate`]s.

use crate::ports::chat_stream::ChatStreamPort;
use crate::ports::chat_update::ChatUpdate;
use crate::ports::conversation_logger::ConversationLogger;
use crate::ports::session_api::SessionApiPort;
use crate::use_cases::send_message::{
    SendError, SendMessageInput, SendMessageOutput, SendMessageUseCase,
};
use crate::use_cases::session_lifecycle::{SessionError, SessionManager};
use kubechat_domain::{Session, SessionId};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of handling a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandAction {
    /// Continue the REPL loop
    Continue,
    /// Exit the REPL
    Exit,
}

/// Controller for one console
pub struct ChatController<S: ChatStreamPort, A: SessionApiPort> {
    sessions: Arc<Mutex<SessionManager<A>>>,
    send_use_case: SendMessageUseCase<S, A>,
    tx: mpsc::UnboundedSender<ChatUpdate>,
}

impl<S: ChatStreamPort, A: SessionApiPort> ChatController<S, A> {
    pub fn new(
        stream_port: Arc<S>,
        sessions: Arc<Mutex<SessionManager<A>>>,
        tx: mpsc::UnboundedSender<ChatUpdate>,
    ) -> Self {
        Self {
            send_use_case: SendMessageUseCase::new(stream_port, sessions.clone(), tx.clone()),
            sessions,
            tx,
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.send_use_case = self.send_use_case.with_conversation_logger(logger);
        self
    }

    pub fn sessions(&self) -> &Arc<Mutex<SessionManager<A>>> {
        &self.sessions
    }

    pub fn is_in_flight(&self) -> bool {
        self.send_use_case.is_in_flight()
    }

    /// Prompt showing the current session's title.
    pub async fn prompt_string(&self) -> String {
        let sessions = self.sessions.lock().await;
        match sessions.current_session() {
            Some(session) => format!("{}> ", session.title),
            None => "> ".to_string(),
        }
    }

    /// Send `text` to the current session and stream the reply.
    ///
    /// Rejections are reported on the update channel as well as returned.
    pub async fn send(&self, text: &str) -> Result<SendMessageOutput, SendError> {
        let session_id = self.sessions.lock().await.current_session_id().clone();
        let result = self
            .send_use_case
            .execute(SendMessageInput::new(session_id, text), CancellationToken::new())
            .await;

        if let Err(SendError::InFlight) = &result {
            self.command_error(&SendError::InFlight.to_string());
        }
        result
    }

    /// Abandon the running exchange. The message keeps the content received
    /// so far.
    pub fn cancel_exchange(&self) {
        if self.send_use_case.cancel() {
            debug!("Cancelled running exchange");
        }
    }

    /// Handle a slash command.
    pub async fn handle_command(&self, cmd: &str) -> CommandAction {
        let parts: Vec<&str> = cmd.trim().splitn(2, ' ').collect();
        let command = parts.first().copied().unwrap_or("");
        let args = parts.get(1).copied().unwrap_or("").trim();

        match command {
            "/quit" | "/exit" | "/q" => {
                self.cancel_exchange();
                self.emit(ChatUpdate::Exit);
                CommandAction::Exit
            }
            "/help" | "/h" | "/?" => {
                self.emit(ChatUpdate::Help);
                CommandAction::Continue
            }
            "/sessions" | "/ls" => {
                let sessions = self.sessions.lock().await;
                self.emit(ChatUpdate::SessionList {
                    sessions: sessions.sessions().to_vec(),
                    current: sessions.current_session_id().clone(),
                });
                CommandAction::Continue
            }
            "/refresh" => {
                let mut sessions = self.sessions.lock().await;
                let count = sessions.list_sessions().await.len();
                self.emit(ChatUpdate::Info {
                    text: format!("{} sessions", count),
                });
                CommandAction::Continue
            }
            "/new" => {
                self.cancel_exchange();
                self.sessions.lock().await.create_ephemeral();
                CommandAction::Continue
            }
            "/switch" => {
                self.handle_switch(args).await;
                CommandAction::Continue
            }
            "/rename" => {
                self.handle_rename(args).await;
                CommandAction::Continue
            }
            "/delete" | "/rm" => {
                self.handle_delete(args).await;
                CommandAction::Continue
            }
            _ => {
                self.emit(ChatUpdate::UnknownCommand {
                    command: command.to_string(),
                });
                CommandAction::Continue
            }
        }
    }

    async fn handle_switch(&self, args: &str) {
        if args.is_empty() {
            self.command_error("Usage: /switch <session>");
            return;
        }
        let mut sessions = self.sessions.lock().await;
        let id = resolve_session(sessions.sessions(), args);
        if &id == sessions.current_session_id() {
            return;
        }
        if sessions.find(&id).is_some() {
            self.cancel_exchange();
        }
        if let Err(e) = sessions.switch_to(&id).await {
            self.command_error(&e.to_string());
        }
    }

    async fn handle_rename(&self, args: &str) {
        let (target, title) = args.split_once(' ').unwrap_or((args, ""));
        if target.is_empty() {
            self.command_error("Usage: /rename <session> <title>");
            return;
        }
        let mut sessions = self.sessions.lock().await;
        let id = resolve_session(sessions.sessions(), target);
        match sessions.rename(&id, title).await {
            Ok(()) => {}
            Err(SessionError::Domain(e)) if e.is_input_error() => {
                self.command_error(&format!("{}. Usage: /rename <session> <title>", e));
            }
            Err(e) => self.command_error(&e.to_string()),
        }
    }

    async fn handle_delete(&self, args: &str) {
        if args.is_empty() {
            self.command_error("Usage: /delete <session>");
            return;
        }
        let mut sessions = self.sessions.lock().await;
        let id = resolve_session(sessions.sessions(), args);
        let deletes_current = &id == sessions.current_session_id();
        let deletable = sessions.find(&id).is_some_and(|s| {
            s.is_ephemeral || sessions.sessions().iter().filter(|o| !o.is_ephemeral).count() > 1
        });
        if deletes_current && deletable {
            self.cancel_exchange();
        }
        if let Err(e) = sessions.delete(&id).await {
            self.command_error(&e.to_string());
        }
    }

    fn command_error(&self, message: &str) {
        self.emit(ChatUpdate::CommandError {
            message: message.to_string(),
        });
    }

    fn emit(&self, update: ChatUpdate) {
        let _ = self.tx.send(update);
    }
}

/// Resolve a session reference: a 1-based position in the list, or an id.
fn resolve_session(sessions: &[Session], reference: &str) -> SessionId {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| sessions.get(i))
        .map(|s| s.id.clone())
        .unwrap_or_else(|| SessionId::from(reference))
}
